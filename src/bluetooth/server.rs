// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bluetooth RFCOMM server implementation.

use anyhow::{anyhow, Context, Result};
use bluer::rfcomm::{Profile, ProfileHandle, Role};
use bluer::Address;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::connection::RfcommConnection;
use super::session::VendorSession;
use crate::state::DeviceState;

/// Bluetooth server that impersonates the configured device.
pub struct DeviceServer {
    session: bluer::Session,
    adapter: bluer::Adapter,
}

impl DeviceServer {
    /// Create a new server on the named adapter, or the default one.
    pub async fn new(adapter_name: Option<&str>) -> Result<Self> {
        info!("Initializing Bluetooth server...");

        // Create BlueZ session
        let session = bluer::Session::new()
            .await
            .context("Failed to connect to BlueZ")?;
        info!("BlueZ session created");

        let adapter = match adapter_name {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        // Ensure adapter is powered on
        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self { session, adapter })
    }

    /// Get the adapter address.
    pub async fn address(&self) -> Result<Address> {
        Ok(self.adapter.address().await?)
    }

    /// Set the device name.
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.adapter.set_alias(name.to_string()).await?;
        info!("Bluetooth name set to: {}", name);
        Ok(())
    }

    /// Advertise the device and answer connections until BlueZ goes away.
    pub async fn serve(&self, state: Arc<DeviceState>) -> Result<()> {
        let config = state.config();
        self.set_name(&config.name).await?;

        let profile = Profile {
            uuid: config.rfcomm_uuid,
            name: Some(config.name.clone()),
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            ..Default::default()
        };
        let handle = self
            .session
            .register_profile(profile)
            .await
            .context("Failed to register RFCOMM profile")?;
        info!("RFCOMM profile registered (UUID: {})", config.rfcomm_uuid);

        // Make adapter discoverable
        self.adapter.set_discoverable(true).await?;
        self.adapter.set_pairable(true).await?;
        info!(
            "Adapter {} is discoverable as '{}'",
            self.address().await?,
            config.name
        );

        Self::accept_loop(handle, state).await
    }

    /// Accept loop for incoming connections.
    async fn accept_loop(mut handle: ProfileHandle, state: Arc<DeviceState>) -> Result<()> {
        info!("Waiting for connections...");

        while let Some(request) = handle.next().await {
            let remote = request.device().to_string();
            info!("Connection from: {}", remote);

            let stream = match request.accept() {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to accept connection from {}: {}", remote, e);
                    continue;
                }
            };

            let connection = RfcommConnection::new(remote);
            let (responses, has_checksum) = state.start_session();
            let session = VendorSession::new(Arc::clone(&connection), responses, has_checksum);
            session.bind();

            // Spawn handler task
            tokio::spawn(async move {
                let remote = connection.remote().to_string();
                if let Err(e) = connection.run(stream).await {
                    error!("Connection with {} failed: {:#}", remote, e);
                }
            });
        }

        Err(anyhow!("RFCOMM profile was unregistered"))
    }
}

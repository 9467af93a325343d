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

//! Soundcore Device Faker

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soundcore_device_faker::bluetooth::DeviceServer;
use soundcore_device_faker::config::{ConfigWatcher, DeviceConfig};
use soundcore_device_faker::state::DeviceState;

#[derive(Parser)]
#[command(name = "soundcore-device-faker")]
#[command(about = "Pretend to be a Soundcore headset over Bluetooth")]
struct Cli {
    /// Device config file (TOML)
    config: Option<PathBuf>,

    /// Bluetooth adapter to use, e.g. hci0
    #[arg(short, long)]
    adapter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("soundcore_device_faker=debug"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!(
        "Starting Soundcore Device Faker v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config_path = cli.config.unwrap_or_else(DeviceConfig::default_path);
    let config = DeviceConfig::load(&config_path)?;
    info!(
        "Device config loaded: '{}' with {} responses",
        config.name,
        config.responses.len()
    );

    let state = DeviceState::new(config);
    let _watcher = ConfigWatcher::start(&config_path, state.clone())?;

    let server = DeviceServer::new(cli.adapter.as_deref()).await?;

    tokio::select! {
        result = server.serve(state) => {
            if let Err(e) = &result {
                error!("Bluetooth server stopped: {:#}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Soundcore Device Faker stopped");
    Ok(())
}

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

//! Device state shared between the RFCOMM server and the config watcher.

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::responses::ResponseTable;

/// Last good configuration plus the response tables of live sessions.
#[derive(Debug)]
pub struct DeviceState {
    /// Configuration used for new sessions.
    config: RwLock<Arc<DeviceConfig>>,

    /// Response tables of sessions that may still be connected.
    sessions: Mutex<Vec<Weak<ResponseTable>>>,
}

impl DeviceState {
    pub fn new(config: DeviceConfig) -> Arc<Self> {
        Arc::new(Self {
            config: RwLock::new(Arc::new(config)),
            sessions: Mutex::new(Vec::new()),
        })
    }

    /// Current configuration.
    pub fn config(&self) -> Arc<DeviceConfig> {
        Arc::clone(&*self.config.read())
    }

    /// Build the response table for a new session.
    ///
    /// Returns the table together with the checksum setting, which stays
    /// fixed for the lifetime of the session.
    pub fn start_session(&self) -> (Arc<ResponseTable>, bool) {
        let config = self.config();
        let table = Arc::new(ResponseTable::from_entries(config.response_pairs()));

        let mut sessions = self.sessions.lock();
        sessions.retain(|session| session.strong_count() > 0);
        sessions.push(Arc::downgrade(&table));
        debug!(
            "Session started with {} responses ({} live sessions)",
            table.len(),
            sessions.len()
        );

        (table, config.has_checksum)
    }

    /// Store a new configuration and push its responses to live sessions.
    pub fn apply_config(&self, config: DeviceConfig) {
        let config = Arc::new(config);
        *self.config.write() = Arc::clone(&config);

        let mut sessions = self.sessions.lock();
        sessions.retain(|session| match session.upgrade() {
            Some(table) => {
                table.replace_all(config.response_pairs());
                true
            }
            None => false,
        });

        info!(
            "Device config applied: {} responses, {} live sessions",
            config.responses.len(),
            sessions.len()
        );
    }

    /// Reload the configuration from disk.
    ///
    /// On failure nothing changes: the previous configuration and every
    /// session's responses stay in effect.
    pub fn reload_from(&self, path: &Path) -> Result<()> {
        info!("Reloading device config from {:?}", path);
        let config = DeviceConfig::load(path)?;
        self.apply_config(config);
        Ok(())
    }

    /// Number of sessions whose response table is still alive.
    #[cfg(test)]
    fn live_sessions(&self) -> usize {
        self.sessions
            .lock()
            .iter()
            .filter(|session| session.strong_count() > 0)
            .count()
    }
}

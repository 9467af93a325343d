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

//! Hot reload of the device file.

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::state::DeviceState;

/// Watches the device file and reloads it into the device state.
pub struct ConfigWatcher {
    /// File watcher (kept alive).
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// The parent directory is watched rather than the file itself, so
    /// editors that replace the file on save are still picked up.
    pub fn start(config_path: &Path, state: Arc<DeviceState>) -> Result<Self> {
        let config_path = config_path.to_path_buf();
        let watch_dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if is_config_change(&event, &config_path) {
                        debug!("Device config changed, reloading...");
                        if let Err(e) = state.reload_from(&config_path) {
                            error!("Keeping previous device config: {:#}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            },
            Config::default().with_poll_interval(Duration::from_millis(500)),
        )?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {:?}", watch_dir))?;
        info!("Watching {:?} for device config changes", watch_dir);

        Ok(Self { _watcher: watcher })
    }
}

/// Whether a file system event is a write to the config file.
fn is_config_change(event: &Event, config_path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }

    let file_name = config_path.file_name();
    event
        .paths
        .iter()
        .any(|path| path == config_path || (file_name.is_some() && path.file_name() == file_name))
}

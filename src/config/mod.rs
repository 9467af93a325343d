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

//! Configuration module.
//!
//! Handles loading the device description file.
//!
//! ```toml
//! name = "Soundcore Life Q30"
//! rfcomm_uuid = "0cf12d31-fac3-4553-bd80-d6832e7b3952"
//! has_checksum = true
//!
//! [[responses]]
//! command = [1, 1]
//! response = [0, 1, 2]
//! ```

mod watcher;

pub use watcher::ConfigWatcher;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::bluetooth::protocol::MAX_PAYLOAD_LEN;
use crate::bluetooth::CommandCode;

/// Directory name under the user's config directory.
const APP_DIR: &str = "soundcore-device-faker";

/// Description of the simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name advertised over Bluetooth.
    pub name: String,

    /// Service UUID of the vendor RFCOMM channel.
    pub rfcomm_uuid: Uuid,

    /// Append a checksum byte to outbound frames.
    #[serde(default = "default_has_checksum")]
    pub has_checksum: bool,

    /// Canned responses, applied in order.
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
}

/// A single command to response mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub command: CommandCode,
    pub response: Vec<u8>,
}

fn default_has_checksum() -> bool {
    true
}

impl DeviceConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every response fits in a frame.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.responses {
            ensure!(
                entry.response.len() <= MAX_PAYLOAD_LEN,
                "Response for command {} is {} bytes, the limit is {}",
                entry.command,
                entry.response.len(),
                MAX_PAYLOAD_LEN
            );
        }
        Ok(())
    }

    /// Responses as `(command, payload)` pairs in file order.
    pub fn response_pairs(&self) -> impl Iterator<Item = (CommandCode, Vec<u8>)> + '_ {
        self.responses
            .iter()
            .map(|entry| (entry.command, entry.response.clone()))
    }

    /// Default location of the device file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("device.toml")
    }
}

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

//! Vendor frame encoding and decoding.
//!
//! ```text
//! ┌──────────────────┬─────────┬───────────┬──────────┬──────────┐
//! │     Preamble     │ Command │  Length   │ Payload  │ Checksum │
//! │ 09 ff 00 00 01   │ 2 bytes │ u16 (LE)  │ variable │ optional │
//! └──────────────────┴─────────┴───────────┴──────────┴──────────┘
//! ```
//!
//! The length field counts the whole frame: header, payload and checksum.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed marker bytes at the start of every frame.
pub const PREAMBLE: [u8; 5] = [0x09, 0xFF, 0x00, 0x00, 0x01];

/// Offset of the command code within a frame.
pub const COMMAND_OFFSET: usize = PREAMBLE.len();

/// Preamble, command and length field.
pub const HEADER_LEN: usize = COMMAND_OFFSET + 2 + 2;

/// Largest payload whose frame length fits the `u16` length field with a
/// checksum byte appended.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - HEADER_LEN - 1;

/// Frame and command code errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame ends before the command code.
    #[error("Frame too short to carry a command: {len} bytes")]
    Truncated { len: usize },

    #[error("Command must be exactly 2 bytes, got {len}")]
    BadCommandLength { len: usize },

    /// Frame length does not fit the length field.
    #[error("Payload of {len} bytes does not fit in a frame")]
    PayloadTooLong { len: usize },
}

/// Two byte command identifier.
///
/// Opaque to the faker: it is only ever compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct CommandCode(pub [u8; 2]);

impl CommandCode {
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl TryFrom<&[u8]> for CommandCode {
    type Error = FrameError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 2]>::try_from(bytes)
            .map(Self)
            .map_err(|_| FrameError::BadCommandLength { len: bytes.len() })
    }
}

impl TryFrom<Vec<u8>> for CommandCode {
    type Error = FrameError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(bytes.as_slice())
    }
}

impl From<CommandCode> for Vec<u8> {
    fn from(command: CommandCode) -> Self {
        command.0.to_vec()
    }
}

/// Extract the command code from an inbound frame.
///
/// Only the command bytes are read. Preamble, length and checksum are not
/// checked.
pub fn decode_command(frame: &[u8]) -> Result<CommandCode, FrameError> {
    frame
        .get(COMMAND_OFFSET..COMMAND_OFFSET + 2)
        .and_then(|bytes| CommandCode::try_from(bytes).ok())
        .ok_or(FrameError::Truncated { len: frame.len() })
}

/// Build an outbound frame.
///
/// An empty payload produces the acknowledge frame.
pub fn encode_frame(
    command: CommandCode,
    payload: &[u8],
    has_checksum: bool,
) -> Result<Vec<u8>, FrameError> {
    let frame_len = HEADER_LEN + payload.len() + usize::from(has_checksum);
    let length = u16::try_from(frame_len).map_err(|_| FrameError::PayloadTooLong {
        len: payload.len(),
    })?;

    let mut frame = Vec::with_capacity(frame_len);
    frame.extend_from_slice(&PREAMBLE);
    frame.extend_from_slice(command.as_bytes());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(payload);

    if has_checksum {
        frame.push(checksum(&frame));
    }

    Ok(frame)
}

/// Sum of all bytes, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

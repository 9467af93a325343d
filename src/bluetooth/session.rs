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

//! Vendor command/response session.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::protocol::{decode_command, encode_frame};
use crate::responses::ResponseTable;

/// Answers vendor frames arriving on one connection.
pub struct VendorSession<C: Connection> {
    connection: Arc<C>,
    responses: Arc<ResponseTable>,
    has_checksum: bool,
}

impl<C: Connection + 'static> VendorSession<C> {
    /// Create a session. Nothing is routed to it until [`bind`](Self::bind).
    pub fn new(connection: Arc<C>, responses: Arc<ResponseTable>, has_checksum: bool) -> Arc<Self> {
        Arc::new(Self {
            connection,
            responses,
            has_checksum,
        })
    }

    /// Register this session as the connection's packet handler.
    pub fn bind(self: &Arc<Self>) {
        let session = Arc::clone(self);
        self.connection
            .set_packet_handler(Box::new(move |data: &[u8]| {
                session.on_packet_received(data)
            }));
    }

    /// Answer one inbound frame.
    ///
    /// Unknown commands get an empty acknowledge frame. Frames too short to
    /// carry a command are logged and left unanswered. A payload too long
    /// to frame or a failed write is returned.
    pub fn on_packet_received(&self, data: &[u8]) -> Result<()> {
        debug!("Received: {}", hex::encode(data));

        let command = match decode_command(data) {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring inbound packet: {}", e);
                return Ok(());
            }
        };

        let (frame, kind) = match self.responses.lookup(&command) {
            Some(payload) => (encode_frame(command, &payload, self.has_checksum)?, "response"),
            None => {
                warn!("No known response for command {}", command);
                (encode_frame(command, &[], self.has_checksum)?, "ack")
            }
        };

        self.connection.write(&frame)?;
        info!("Sent {} for {}: {}", kind, command, hex::encode(&frame));

        Ok(())
    }
}

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

//! Individual RFCOMM connection.

use anyhow::{anyhow, Result};
use bluer::rfcomm::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Read buffer size. RFCOMM frames from the app are far smaller.
const READ_BUFFER_SIZE: usize = 1024;

/// Callback invoked with every chunk of inbound bytes.
///
/// An error return closes the connection.
pub type PacketHandler = Box<dyn Fn(&[u8]) -> Result<()> + Send + Sync>;

/// Byte stream connection to the companion app.
pub trait Connection: Send + Sync {
    /// Queue bytes for sending.
    fn write(&self, data: &[u8]) -> Result<()>;

    /// Route inbound bytes to `handler`, replacing any previous handler.
    fn set_packet_handler(&self, handler: PacketHandler);
}

/// Connection over an accepted RFCOMM stream.
pub struct RfcommConnection {
    remote: String,
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
    handler: Mutex<Option<PacketHandler>>,
}

impl RfcommConnection {
    /// Create a new connection for the given remote device.
    pub fn new(remote: impl Into<String>) -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            remote: remote.into(),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            handler: Mutex::new(None),
        })
    }

    /// Remote device description.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Pump the stream until the remote closes it or an I/O error occurs.
    ///
    /// The packet handler is released when this returns.
    pub async fn run(self: Arc<Self>, stream: Stream) -> Result<()> {
        info!("Connection with {} started", self.remote);

        let outbound_rx = self
            .outbound_rx
            .lock()
            .take()
            .ok_or_else(|| anyhow!("Connection with {} is already running", self.remote))?;

        let result = self.pump(stream, outbound_rx).await;
        self.handler.lock().take();

        info!("Connection with {} ended", self.remote);
        result
    }

    async fn pump(
        &self,
        stream: Stream,
        mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            tokio::select! {
                read = reader.read(&mut buf) => match read? {
                    0 => {
                        // EOF - connection closed
                        info!("Connection closed by {}", self.remote);
                        return Ok(());
                    }
                    n => self.dispatch(&buf[..n])?,
                },
                Some(frame) = outbound_rx.recv() => {
                    writer.write_all(&frame).await?;
                    writer.flush().await?;
                }
            }
        }
    }

    fn dispatch(&self, data: &[u8]) -> Result<()> {
        match self.handler.lock().as_ref() {
            Some(handler) => handler(data),
            None => {
                debug!("No packet handler, dropping {} bytes", data.len());
                Ok(())
            }
        }
    }
}

impl Connection for RfcommConnection {
    fn write(&self, data: &[u8]) -> Result<()> {
        self.outbound_tx
            .send(data.to_vec())
            .map_err(|_| anyhow!("Connection with {} is closed", self.remote))
    }

    fn set_packet_handler(&self, handler: PacketHandler) {
        *self.handler.lock() = Some(handler);
    }
}

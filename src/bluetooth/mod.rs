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

//! Bluetooth communication module.
//!
//! Handles the vendor RFCOMM channel the companion app talks to.

pub mod connection;
pub mod protocol;
pub mod server;
pub mod session;

pub use connection::{Connection, PacketHandler, RfcommConnection};
pub use protocol::{decode_command, encode_frame, CommandCode, FrameError};
pub use server::DeviceServer;
pub use session::VendorSession;

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

//! Canned responses indexed by command code.
//!
//! The table is held as an immutable snapshot. Every write builds a new map
//! and swaps it in, so a lookup racing a reload sees either the old or the
//! new table, never a half-cleared one.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::bluetooth::CommandCode;

type Snapshot = Arc<HashMap<CommandCode, Vec<u8>>>;

/// Mapping from command code to response payload.
#[derive(Debug, Default)]
pub struct ResponseTable {
    entries: RwLock<Snapshot>,
}

impl ResponseTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from an ordered list of entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CommandCode, Vec<u8>)>,
    {
        let table = Self::new();
        table.replace_all(entries);
        table
    }

    /// Insert or overwrite the response for a command.
    pub fn set_response(&self, command: CommandCode, payload: Vec<u8>) {
        let mut guard = self.entries.write();
        let mut next = (**guard).clone();
        next.insert(command, payload);
        *guard = Arc::new(next);
    }

    /// Remove every response.
    pub fn clear_responses(&self) {
        *self.entries.write() = Snapshot::default();
    }

    /// Replace the whole table in one swap.
    ///
    /// Entries are applied in order, so a later duplicate command wins.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (CommandCode, Vec<u8>)>,
    {
        let next: HashMap<_, _> = entries.into_iter().collect();
        debug!("Installing response table with {} entries", next.len());
        *self.entries.write() = Arc::new(next);
    }

    /// Get the response for a command, if one is configured.
    pub fn lookup(&self, command: &CommandCode) -> Option<Vec<u8>> {
        self.snapshot().get(command).cloned()
    }

    /// Current contents. Later writes do not affect the returned snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// Copyright 2025 Chris Custine
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

//! Events published by sprite atlases and tile sources.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::request::FetchError;

/// Default broadcast channel capacity for component events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Which kind of data became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Style resources such as the sprite atlas.
    Style,
    /// Source metadata (the tile manifest).
    Metadata,
}

/// Events emitted to listeners.
#[derive(Debug, Clone)]
pub enum MapEvent {
    /// New data is ready to be queried.
    Data { data_type: DataType },
    /// A fetch failed.
    Error { error: Arc<FetchError> },
}

impl MapEvent {
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Listener registry backed by a broadcast channel.
///
/// Sending never fails: events published while nobody is subscribed are
/// dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: broadcast::Sender<MapEvent>,
}

impl EventSender {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn data(&self, data_type: DataType) {
        let _ = self.tx.send(MapEvent::Data { data_type });
    }

    pub fn error(&self, error: Arc<FetchError>) {
        let _ = self.tx.send(MapEvent::Error { error });
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

// Copyright 2025 HEM Sp. z o.o.
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

use crate::definitions::{PlaybackState, StreamUris};
use crate::errors::PlaybackFailure;

/// Descriptor of the media currently loaded into the session.
///
/// Only present once resolution succeeded for the live request; cleared on
/// stop, on error and by every new prepare.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MediaDescriptor {
    pub media_id: String,
    pub title: String,
    pub duration_ms: u64,
    pub artwork_url: String,
    pub stream_uris: StreamUris,
}

impl MediaDescriptor {
    /// Clamp a requested position into `[0, duration_ms]`.
    pub fn clamp_position(&self, position_ms: i64) -> u64 {
        if position_ms <= 0 {
            return 0;
        }
        (position_ms as u64).min(self.duration_ms)
    }
}

/// Published view of a session. Observers re-render fully from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub metadata: Option<MediaDescriptor>,
    pub failure: Option<PlaybackFailure>,
}

/// Mutable session state, owned and mutated by the orchestrator only.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub snapshot: SessionSnapshot,
    /// Whether the last play/pause intent sent to the engine was "play".
    pub wants_to_play: bool,
    /// Set between a successful resolution and the engine's first ready
    /// report, when prepare should chain into play.
    pub auto_play_pending: bool,
}

impl SessionState {
    pub fn state(&self) -> PlaybackState {
        self.snapshot.state
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.snapshot.state = state;
    }

    pub fn has_stream(&self) -> bool {
        self.snapshot.metadata.is_some()
    }

    pub fn metadata(&self) -> Option<&MediaDescriptor> {
        self.snapshot.metadata.as_ref()
    }

    pub fn load(&mut self, descriptor: MediaDescriptor) {
        self.snapshot.metadata = Some(descriptor);
    }

    /// Drop the loaded media and every play intent attached to it.
    pub fn clear_media(&mut self) {
        self.snapshot.metadata = None;
        self.wants_to_play = false;
        self.auto_play_pending = false;
    }

    pub fn enter_stopped(&mut self) {
        self.clear_media();
        self.snapshot.failure = None;
        self.snapshot.state = PlaybackState::Stopped;
    }

    pub fn enter_buffering(&mut self) {
        self.clear_media();
        self.snapshot.failure = None;
        self.snapshot.state = PlaybackState::Buffering;
    }

    pub fn enter_error(&mut self, failure: PlaybackFailure) {
        self.clear_media();
        self.snapshot.failure = Some(failure);
        self.snapshot.state = PlaybackState::Error;
    }
}

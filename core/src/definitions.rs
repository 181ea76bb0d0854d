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

use std::fmt;

/// Authoritative playback state of a session. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum PlaybackState {
    /// Nothing has been prepared since the session started.
    #[default]
    None,
    /// Media is being resolved or the engine is filling its buffers.
    Buffering,
    /// The engine reported that audio is actually being rendered.
    Playing,
    /// A stream is loaded but the engine is not rendering it.
    Paused,
    /// Playback was stopped; a new prepare is required.
    Stopped,
    /// Resolution or the engine failed; a new prepare is required.
    Error,
}

impl PlaybackState {
    /// `Playing` or `Buffering`: the session holds work the user is waiting on.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Buffering => write!(f, "buffering"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DuckLevel {
    #[default]
    Normal,
    Ducked,
}

/// Playable stream locations produced by a successful resolution.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StreamUris {
    pub audio: String,
    pub video: String,
}

/// Transport notifications reported by the playback engine, independent of
/// when commands were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Idle,
    Buffering,
    Ready { wants_to_play: bool },
    Ended,
    Error(String),
}

/// Raw focus notifications delivered by the host audio system.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusChange {
    Gained,
    Lost,
    LostTransient,
    LostTransientCanDuck,
    /// Output is about to become audible through a different route,
    /// e.g. headphones were unplugged.
    BecomingNoisy,
}

/// Engine seconds to externally observed milliseconds.
pub fn engine_secs_to_ms(secs: u64) -> u64 {
    secs.saturating_mul(1000)
}

/// Milliseconds to engine seconds, truncating.
pub fn ms_to_engine_secs(ms: u64) -> u64 {
    ms / 1000
}

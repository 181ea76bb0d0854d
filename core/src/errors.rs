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

use thiserror::Error;

/// Result of a client command that could not be carried out.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum PlaybackError {
    /// The host audio system refused focus; nothing was started.
    #[error("Audio focus denied")]
    FocusDenied,

    #[error("Playback session is closed")]
    SessionClosed,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ResolveError {
    #[error("No playable stream for {0}")]
    NoStream(String),

    #[error("Resolver unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum EngineError {
    #[error("Feature not supported")]
    FeatureNotSupported,

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Engine failure: {0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum FocusError {
    /// The host cannot deliver focus notifications at all.
    #[error("Focus notifications not supported")]
    NotificationsUnsupported,

    #[error("Audio system error: {0}")]
    Host(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Playback engine refused transport notifications: {0}")]
    TransportUnavailable(#[source] EngineError),

    #[error("Audio focus notifications unavailable: {0}")]
    FocusUnavailable(#[source] FocusError),
}

/// Why a session entered [`PlaybackState::Error`](crate::definitions::PlaybackState::Error).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlaybackFailure {
    /// The resolver returned no usable stream.
    Resolution(String),
    /// The playback engine reported an internal error.
    Engine(String),
}

impl std::fmt::Display for PlaybackFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackFailure::Resolution(reason) => write!(f, "resolution failed: {}", reason),
            PlaybackFailure::Engine(cause) => write!(f, "engine failed: {}", cause),
        }
    }
}

impl From<ResolveError> for PlaybackFailure {
    fn from(error: ResolveError) -> Self {
        PlaybackFailure::Resolution(error.to_string())
    }
}

impl From<EngineError> for PlaybackFailure {
    fn from(error: EngineError) -> Self {
        PlaybackFailure::Engine(error.to_string())
    }
}

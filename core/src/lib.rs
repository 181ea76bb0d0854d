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

pub mod audio_focus;
pub mod config;
pub mod control;
pub mod definitions;
pub mod engine;
pub mod errors;
pub mod orchestrator;
pub mod resolver;
pub mod session;
pub mod session_state;
pub mod subscribers;

#[cfg(test)]
mod testing;

pub use audio_focus::{AudioFocusHost, FocusChangeStream, FocusState};
pub use config::SessionConfig;
pub use control::PlaybackControl;
pub use definitions::{DuckLevel, FocusChange, PlaybackState, StreamUris, TransportEvent};
pub use engine::{PlaybackEngine, TransportEventStream};
pub use errors::{
    EngineError, FocusError, PlaybackError, PlaybackFailure, ResolveError, SessionError,
};
pub use resolver::{MediaResolver, ResolvedMedia};
pub use session::PlaybackSession;
pub use session_state::{MediaDescriptor, SessionSnapshot};
pub use subscribers::PlaybackObserver;

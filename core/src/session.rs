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

use std::sync::Arc;

use log::{debug, error, info};

use crate::audio_focus::AudioFocusHost;
use crate::config::SessionConfig;
use crate::control::PlaybackControl;
use crate::engine::PlaybackEngine;
use crate::errors::SessionError;
use crate::orchestrator::{Orchestrator, OrchestratorHandle, SessionId};
use crate::resolver::MediaResolver;

/// One playback lifetime, from connect to disconnect.
///
/// Owns the orchestrator task; every collaborator is handed in here and
/// nowhere else. Dropping the session ends it.
pub struct PlaybackSession {
    id: SessionId,
    handle: OrchestratorHandle,
    control: PlaybackControl,
}

impl PlaybackSession {
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: SessionConfig,
        resolver: Arc<dyn MediaResolver>,
        engine: Arc<dyn PlaybackEngine>,
        focus_host: Arc<dyn AudioFocusHost>,
    ) -> Result<Self, SessionError> {
        let (orchestrator, control) = Orchestrator::new(config, resolver, engine, focus_host)?;
        let id = orchestrator.id();
        info!("[{}] Starting playback session", id);
        let handle = orchestrator.run();
        Ok(Self { id, handle, control })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn control(&self) -> PlaybackControl {
        self.control.clone()
    }

    /// Whether the session ended on its own, e.g. stopped with no UI attached.
    pub fn is_closed(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop playback, release the engine and focus, and wait for the session to end.
    pub async fn shutdown(self) {
        debug!("[{}] Shutting down playback session", self.id);
        match self.handle.shutdown().await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                debug!("[{}] Session task was cancelled during shutdown", self.id);
            }
            Err(e) if e.is_panic() => {
                error!("[{}] Session task panicked during shutdown: {}", self.id, e);
                std::panic::resume_unwind(e.into_panic());
            }
            Err(e) => error!("[{}] Error shutting down session: {}", self.id, e),
        }
    }

    /// Wait until the session ends without asking it to.
    pub async fn closed(self) {
        if let Err(e) = self.handle.await_join().await {
            error!("[{}] Session task failed: {}", self.id, e);
        }
    }

    pub fn abort(self) {
        self.handle.abort();
    }
}

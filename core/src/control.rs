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

use tokio::sync::{mpsc, oneshot, watch};

use crate::audio_focus::FocusState;
use crate::definitions::PlaybackState;
use crate::errors::{PlaybackError, PlaybackFailure};
use crate::orchestrator::Command;
use crate::session_state::{MediaDescriptor, SessionSnapshot};
use crate::subscribers::PlaybackObserver;

/// Cloneable client handle of a playback session.
///
/// Every command is queued onto the session's serialization point and
/// resolves once it has been applied. Snapshot reads never wait on the
/// session; they return the latest published snapshot.
#[derive(Clone)]
pub struct PlaybackControl {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl PlaybackControl {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { command_tx, snapshot_rx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx.send(build(reply)).await.map_err(|_| PlaybackError::SessionClosed)?;
        rx.await.map_err(|_| PlaybackError::SessionClosed)
    }

    /// Resolve `media_id` and load it, stopping whatever is active first.
    pub async fn prepare(&self, media_id: impl Into<String>) -> Result<(), PlaybackError> {
        let media_id = media_id.into();
        self.request(|reply| Command::Prepare { media_id, reply }).await
    }

    /// Start a resolved stream. Fails with [`PlaybackError::FocusDenied`]
    /// when the audio system refuses focus; a no-op when nothing is playable.
    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Play { reply }).await?
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Pause when playing, play otherwise.
    pub async fn play_or_pause(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::PlayOrPause { reply }).await?
    }

    /// Can be called at any time.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Seek within the loaded media; positions outside it are clamped.
    pub async fn seek(&self, position_ms: i64) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Seek { position_ms, reply }).await
    }

    /// Current playback position in milliseconds, `0` with nothing loaded.
    pub async fn position_ms(&self) -> Result<u64, PlaybackError> {
        self.request(|reply| Command::Position { reply }).await
    }

    pub async fn focus_state(&self) -> Result<FocusState, PlaybackError> {
        self.request(|reply| Command::Focus { reply }).await
    }

    /// Observers only see changes committed after they were added.
    pub async fn add_subscriber(
        &self,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Subscribe { observer, reply }).await
    }

    pub async fn remove_subscriber(
        &self,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<bool, PlaybackError> {
        self.request(|reply| Command::Unsubscribe { observer, reply }).await
    }

    /// Report whether a UI is showing the session. With no UI attached the
    /// session ends as soon as it is neither playing nor buffering.
    pub async fn set_ui_attached(&self, attached: bool) -> Result<(), PlaybackError> {
        self.request(|reply| Command::SetUiAttached { attached, reply }).await
    }

    pub fn current_state(&self) -> PlaybackState {
        self.snapshot_rx.borrow().state
    }

    pub fn current_metadata(&self) -> Option<MediaDescriptor> {
        self.snapshot_rx.borrow().metadata.clone()
    }

    pub fn last_failure(&self) -> Option<PlaybackFailure> {
        self.snapshot_rx.borrow().failure.clone()
    }

    pub fn current_snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver that wakes on every published snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        !self.command_tx.is_closed()
    }
}

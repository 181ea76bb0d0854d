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

use futures::{Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::audio_focus::{
    AudioFocusCoordinator, AudioFocusHost, FocusChangeStream, FocusEvent, FocusState,
};
use crate::config::SessionConfig;
use crate::control::PlaybackControl;
use crate::definitions::{DuckLevel, FocusChange, PlaybackState, TransportEvent};
use crate::engine::{EngineAdapter, PlaybackEngine, TransportEventStream};
use crate::errors::{FocusError, PlaybackError, PlaybackFailure, SessionError};
use crate::resolver::{MediaResolver, ResolutionOutcome, ResolutionRequest, ResolverAdapter};
use crate::session_state::{SessionSnapshot, SessionState};
use crate::subscribers::{PlaybackObserver, SubscriberSet};

pub type SessionId = Uuid;

type Reply<T> = oneshot::Sender<T>;

/// Client commands, processed one at a time in arrival order.
pub(crate) enum Command {
    Prepare { media_id: String, reply: Reply<()> },
    Play { reply: Reply<Result<(), PlaybackError>> },
    Pause { reply: Reply<()> },
    PlayOrPause { reply: Reply<Result<(), PlaybackError>> },
    Stop { reply: Reply<()> },
    Seek { position_ms: i64, reply: Reply<()> },
    Position { reply: Reply<u64> },
    Focus { reply: Reply<FocusState> },
    Subscribe { observer: Arc<dyn PlaybackObserver>, reply: Reply<()> },
    Unsubscribe { observer: Arc<dyn PlaybackObserver>, reply: Reply<bool> },
    SetUiAttached { attached: bool, reply: Reply<()> },
}

/// Handle to control the orchestrator task
pub struct OrchestratorHandle {
    join: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl OrchestratorHandle {
    /// Request cooperative shutdown without awaiting completion.
    pub fn request_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.request_shutdown();
        self.join.await
    }

    /// Await the task without asking it to stop.
    pub async fn await_join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn abort(self) {
        self.join.abort();
    }
}

/// The session's single serialization point.
///
/// Client commands, resolver results, engine transport notifications and
/// host focus notifications all land in one `select!` loop, so no two
/// handlers ever interleave their mutations of the session state.
pub struct Orchestrator {
    id: SessionId,
    config: SessionConfig,

    // Inputs
    command_rx: mpsc::Receiver<Command>,
    resolution_rx: mpsc::UnboundedReceiver<ResolutionOutcome>,
    transport_rx: Option<TransportEventStream>,
    focus_rx: Option<FocusChangeStream>,

    // Collaborators
    resolver: ResolverAdapter,
    engine: EngineAdapter,
    focus: AudioFocusCoordinator,

    // Owned state
    session: SessionState,
    live_request: Option<ResolutionRequest>,
    subscribers: SubscriberSet,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    ui_attached: bool,
    finished: bool,
}

async fn next_or_pending<S: Stream + Unpin>(stream: &mut Option<S>) -> Option<S::Item> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

impl Orchestrator {
    /// Wire the collaborators together and return the orchestrator with a
    /// control handle bound to it. Nothing runs until [`Orchestrator::run`].
    pub fn new(
        config: SessionConfig,
        resolver: Arc<dyn MediaResolver>,
        engine: Arc<dyn PlaybackEngine>,
        focus_host: Arc<dyn AudioFocusHost>,
    ) -> Result<(Self, PlaybackControl), SessionError> {
        let id = Uuid::new_v4();
        let engine = EngineAdapter::new(engine);
        let transport_rx = engine.listen().map_err(SessionError::TransportUnavailable)?;

        let focus = AudioFocusCoordinator::new(focus_host);
        let focus_rx = match focus.listen() {
            Ok(rx) => Some(rx),
            Err(FocusError::NotificationsUnsupported) => {
                warn!("[{}] No focus notifications from the audio system", id);
                None
            }
            Err(e) => return Err(SessionError::FocusUnavailable(e)),
        };

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (resolution_tx, resolution_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let orchestrator = Self {
            id,
            config,
            command_rx,
            resolution_rx,
            transport_rx: Some(transport_rx),
            focus_rx,
            resolver: ResolverAdapter::new(resolver, resolution_tx),
            engine,
            focus,
            session: SessionState::default(),
            live_request: None,
            subscribers: SubscriberSet::new(),
            snapshot_tx,
            ui_attached: true,
            finished: false,
        };
        Ok((orchestrator, PlaybackControl::new(command_tx, snapshot_rx)))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Spawn the orchestrator event loop in background and return a handle.
    pub fn run(mut self) -> OrchestratorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            info!("[{}] Playback session started", self.id);
            loop {
                select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        info!("[{}] Session shutdown requested", self.id);
                        self.release().await;
                        break;
                    }
                    cmd = self.command_rx.recv() => {
                        match cmd {
                            Some(cmd) => self.on_command(cmd).await,
                            None => {
                                info!("[{}] All controls dropped; ending session", self.id);
                                self.release().await;
                                break;
                            }
                        }
                    }
                    Some(outcome) = self.resolution_rx.recv() => {
                        self.on_resolution(outcome).await;
                    }
                    evt = next_or_pending(&mut self.transport_rx) => {
                        match evt {
                            Some(evt) => self.on_transport(evt).await,
                            None => {
                                warn!("[{}] Engine transport stream closed", self.id);
                                self.transport_rx = None;
                            }
                        }
                    }
                    change = next_or_pending(&mut self.focus_rx) => {
                        match change {
                            Some(change) => self.on_focus_change(change).await,
                            None => {
                                warn!("[{}] Audio focus stream closed", self.id);
                                self.focus_rx = None;
                            }
                        }
                    }
                }
                if self.finished {
                    break;
                }
            }
            info!("[{}] Playback session ended", self.id);
        });
        OrchestratorHandle { join, shutdown_tx: Some(shutdown_tx) }
    }

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Prepare { media_id, reply } => {
                self.prepare(media_id).await;
                let _ = reply.send(());
            }
            Command::Play { reply } => {
                let result = self.play().await;
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                self.pause().await;
                let _ = reply.send(());
            }
            Command::PlayOrPause { reply } => {
                // decided by intent, so a toggle during an in-flight pause resumes
                let result = if self.session.wants_to_play {
                    self.pause().await;
                    Ok(())
                } else {
                    self.play().await
                };
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            Command::Seek { position_ms, reply } => {
                self.seek(position_ms);
                let _ = reply.send(());
            }
            Command::Position { reply } => {
                let position =
                    if self.session.has_stream() { self.engine.position_ms() } else { 0 };
                let _ = reply.send(position);
            }
            Command::Focus { reply } => {
                let _ = reply.send(self.focus.state());
            }
            Command::Subscribe { observer, reply } => {
                self.subscribers.add(observer);
                debug!("[{}] Subscriber added ({} total)", self.id, self.subscribers.len());
                let _ = reply.send(());
            }
            Command::Unsubscribe { observer, reply } => {
                let removed = self.subscribers.remove(&observer);
                let _ = reply.send(removed);
            }
            Command::SetUiAttached { attached, reply } => {
                self.set_ui_attached(attached).await;
                let _ = reply.send(());
            }
        }
    }

    /// Publish the working snapshot if it differs from the last published one.
    async fn commit(&mut self) {
        let snapshot = self.session.snapshot.clone();
        if *self.snapshot_tx.borrow() == snapshot {
            return;
        }
        debug!(
            "[{}] State -> {} ({})",
            self.id,
            snapshot.state,
            snapshot.metadata.as_ref().map(|m| m.media_id.as_str()).unwrap_or("-")
        );
        self.snapshot_tx.send_replace(snapshot.clone());
        self.subscribers.notify(&snapshot).await;
    }

    async fn prepare(&mut self, media_id: String) {
        debug!("[{}] Prepare {}", self.id, media_id);
        if self.session.state().is_active() {
            // fresh start: nothing of the previous media may leak into this one
            self.halt();
            self.session.enter_stopped();
            self.commit().await;
        } else if self.engine.is_prepared() {
            // paused media: flush the old source but keep focus
            self.engine.stop();
        }
        let request = self.resolver.next_request(&media_id);
        self.live_request = Some(request.clone());
        self.session.enter_buffering();
        self.session.auto_play_pending = self.config.auto_play_on_prepare;
        self.commit().await;
        self.resolver.resolve(request);
    }

    async fn play(&mut self) -> Result<(), PlaybackError> {
        let state = self.session.state();
        let startable = match state {
            PlaybackState::Paused | PlaybackState::Buffering => true,
            // a pause is still in flight
            PlaybackState::Playing => !self.session.wants_to_play,
            _ => false,
        };
        if !self.session.has_stream() || !startable {
            debug!("[{}] Play ignored in state {}", self.id, state);
            return Ok(());
        }
        if !self.focus.request_focus() {
            warn!("[{}] Audio focus denied, not starting playback", self.id);
            return Err(PlaybackError::FocusDenied);
        }
        self.session.wants_to_play = true;
        self.session.auto_play_pending = false;
        if let Err(e) = self.engine.play() {
            self.fail(e.into()).await;
        }
        Ok(())
    }

    async fn pause(&mut self) {
        let in_flight =
            self.session.state() == PlaybackState::Playing || self.session.wants_to_play;
        if !self.session.has_stream() || !in_flight {
            debug!("[{}] Pause ignored in state {}", self.id, self.session.state());
            return;
        }
        self.session.wants_to_play = false;
        if let Err(e) = self.engine.pause() {
            self.fail(e.into()).await;
        }
    }

    async fn stop(&mut self) {
        debug!("[{}] Stop", self.id);
        self.halt();
        self.session.enter_stopped();
        self.commit().await;
        if !self.ui_attached {
            info!("[{}] Stopped with no UI attached; ending session", self.id);
            self.finished = true;
        }
    }

    fn seek(&mut self, position_ms: i64) {
        let Some(descriptor) = self.session.metadata() else {
            debug!("[{}] Seek ignored, nothing resolved", self.id);
            return;
        };
        let clamped = descriptor.clamp_position(position_ms);
        if let Err(e) = self.engine.seek_ms(clamped) {
            warn!("[{}] Seek to {}ms failed: {}", self.id, clamped, e);
        }
    }

    async fn set_ui_attached(&mut self, attached: bool) {
        debug!("[{}] UI {}", self.id, if attached { "attached" } else { "detached" });
        self.ui_attached = attached;
        if !attached && !self.session.state().is_active() {
            self.stop().await;
        }
    }

    /// Release the engine and focus and retire the live request. Callers
    /// decide which state follows.
    fn halt(&mut self) {
        self.live_request = None;
        self.engine.stop();
        if self.focus.state().duck_level == DuckLevel::Ducked {
            self.engine.unduck();
        }
        self.focus.abandon_focus();
    }

    async fn fail(&mut self, failure: PlaybackFailure) {
        error!("[{}] Playback failed: {}", self.id, failure);
        self.halt();
        self.session.enter_error(failure);
        self.commit().await;
    }

    async fn release(&mut self) {
        self.halt();
        self.session.enter_stopped();
        self.commit().await;
    }

    async fn on_resolution(&mut self, outcome: ResolutionOutcome) {
        let ResolutionOutcome { request, result } = outcome;
        if self.live_request.as_ref().map(|r| r.token) != Some(request.token) {
            debug!(
                "[{}] Discarding stale resolution of {} (token {})",
                self.id, request.media_id, request.token
            );
            return;
        }
        self.live_request = None;
        match result {
            Ok(media) => {
                let descriptor = media.into_descriptor(request.media_id);
                info!("[{}] Resolved {} \"{}\"", self.id, descriptor.media_id, descriptor.title);
                if let Err(e) = self.engine.prepare(&descriptor.stream_uris) {
                    self.fail(e.into()).await;
                    return;
                }
                self.session.load(descriptor);
                self.commit().await;
            }
            Err(e) => self.fail(e.into()).await,
        }
    }

    async fn on_transport(&mut self, event: TransportEvent) {
        if self.engine.discard_stale(&event) {
            debug!("[{}] Discarding {:?} from a stopped source", self.id, event);
            return;
        }
        if !self.session.has_stream() {
            debug!("[{}] Ignoring {:?}, no stream loaded", self.id, event);
            return;
        }
        debug!("[{}] Transport {:?}", self.id, event);
        match event {
            TransportEvent::Idle => self.stop().await,
            TransportEvent::Buffering => {
                self.session.set_state(PlaybackState::Buffering);
                self.commit().await;
            }
            TransportEvent::Ready { wants_to_play: true } => {
                self.session.auto_play_pending = false;
                self.session.wants_to_play = true;
                self.session.set_state(PlaybackState::Playing);
                self.commit().await;
            }
            TransportEvent::Ready { wants_to_play: false } => {
                if self.session.auto_play_pending {
                    self.session.auto_play_pending = false;
                    if self.play().await.is_ok() {
                        // stays buffering until the engine reports it is playing
                        return;
                    }
                }
                self.session.set_state(PlaybackState::Paused);
                self.commit().await;
            }
            TransportEvent::Ended => self.stop().await,
            TransportEvent::Error(cause) => self.fail(PlaybackFailure::Engine(cause)).await,
        }
    }

    async fn on_focus_change(&mut self, change: FocusChange) {
        let Some(event) = self.focus.translate(change) else {
            return;
        };
        debug!("[{}] Focus {:?}", self.id, event);
        match event {
            FocusEvent::Lost { can_duck: true, .. } => {
                if self.engine.duck() {
                    self.focus.set_duck_level(DuckLevel::Ducked);
                }
            }
            FocusEvent::Lost { transient, .. } => {
                let resume = transient
                    && (self.playback_wanted() || self.focus.state().resume_on_regain);
                self.session.auto_play_pending = false;
                self.pause().await;
                self.focus.set_resume_on_regain(resume);
            }
            FocusEvent::BecomingNoisy => {
                self.session.auto_play_pending = false;
                self.pause().await;
                self.focus.set_resume_on_regain(false);
            }
            FocusEvent::Gained => {
                if self.focus.state().duck_level == DuckLevel::Ducked {
                    self.engine.unduck();
                    self.focus.set_duck_level(DuckLevel::Normal);
                }
                if !self.focus.take_resume_on_regain() {
                    return;
                }
                if self.session.has_stream() {
                    if let Err(e) = self.play().await {
                        warn!("[{}] Could not resume after focus regain: {}", self.id, e);
                    }
                } else if self.session.state() == PlaybackState::Buffering {
                    // still resolving: start once the engine is ready
                    self.session.auto_play_pending = true;
                }
            }
        }
    }

    fn playback_wanted(&self) -> bool {
        self.session.state() == PlaybackState::Playing
            || self.session.wants_to_play
            || self.session.auto_play_pending
    }
}

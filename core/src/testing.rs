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

//! Mock collaborators shared by the session tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc::{channel, Sender};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Duration};

use crate::audio_focus::{AudioFocusHost, FocusChangeStream};
use crate::control::PlaybackControl;
use crate::definitions::{FocusChange, PlaybackState, TransportEvent};
use crate::engine::{PlaybackEngine, TransportEventStream};
use crate::errors::{EngineError, FocusError, ResolveError};
use crate::resolver::{MediaResolver, ResolvedMedia};
use crate::session_state::{MediaDescriptor, SessionSnapshot};
use crate::subscribers::PlaybackObserver;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub async fn short_wait() {
    sleep(Duration::from_millis(20)).await
}

pub fn media(id: &str) -> ResolvedMedia {
    ResolvedMedia {
        audio_uri: format!("https://media.invalid/{}/140", id),
        video_uri: format!("https://media.invalid/{}/160", id),
        title: format!("Title of {}", id),
        duration_ms: 180_000,
        artwork_url: format!("https://media.invalid/{}/maxres.jpg", id),
    }
}

pub async fn wait_until(
    control: &PlaybackControl,
    what: &str,
    condition: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = control.watch();
    let snapshot = timeout(WAIT, rx.wait_for(condition))
        .await
        .unwrap_or_else(|_| {
            panic!("timed out waiting for {}, at {:?}", what, control.current_snapshot())
        })
        .expect("session snapshot channel closed")
        .clone();
    snapshot
}

pub async fn wait_for_state(control: &PlaybackControl, state: PlaybackState) -> SessionSnapshot {
    wait_until(control, &state.to_string(), |s| s.state == state).await
}

pub async fn wait_for_media(control: &PlaybackControl, media_id: &str) -> SessionSnapshot {
    wait_until(control, media_id, |s| {
        s.metadata.as_ref().map(|m| m.media_id == media_id).unwrap_or(false)
    })
    .await
}

type PendingResolution = (String, oneshot::Sender<Result<ResolvedMedia, ResolveError>>);

/// Resolver whose lookups park until the test completes them.
#[derive(Default)]
pub struct MockResolver {
    pending: Mutex<Vec<PendingResolution>>,
    started: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub async fn wait_pending(&self, media_id: &str) {
        timeout(WAIT, async {
            while !self.pending.lock().unwrap().iter().any(|(id, _)| id == media_id) {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no resolution of {} started", media_id));
    }

    /// Complete the oldest pending lookup of `media_id`.
    pub async fn complete(&self, media_id: &str, result: Result<ResolvedMedia, ResolveError>) {
        self.wait_pending(media_id).await;
        let tx = {
            let mut pending = self.pending.lock().unwrap();
            let index = pending.iter().position(|(id, _)| id == media_id).unwrap();
            pending.remove(index).1
        };
        let _ = tx.send(result);
    }

    pub async fn succeed(&self, media_id: &str) {
        self.complete(media_id, Ok(media(media_id))).await;
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn resolve(&self, media_id: &str) -> Result<ResolvedMedia, ResolveError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push((media_id.to_string(), tx));
        self.started.fetch_add(1, Ordering::SeqCst);
        rx.await
            .unwrap_or_else(|_| Err(ResolveError::Unavailable("test dropped the lookup".into())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Prepare(String, String),
    Play,
    Pause,
    Stop,
    Seek(u64),
    Duck,
    Unduck,
}

/// Engine that reports transport changes the way a real one would:
/// prepare buffers then becomes ready, play/pause flip readiness, stopping a
/// prepared engine idles. While held, notifications queue up in order until
/// [`MockEngine::release`], like an engine whose callbacks run late.
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    tx: Mutex<Sender<TransportEvent>>,
    held: Mutex<Option<Vec<TransportEvent>>>,
    rx: Mutex<Option<TransportEventStream>>,
    play_when_ready: AtomicBool,
    prepared: AtomicBool,
    position_secs: AtomicU64,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = channel(64);
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            tx: Mutex::new(tx),
            held: Mutex::new(None),
            rx: Mutex::new(Some(rx)),
            play_when_ready: AtomicBool::new(false),
            prepared: AtomicBool::new(false),
            position_secs: AtomicU64::new(0),
        })
    }

    pub fn emit(&self, event: TransportEvent) {
        if let Some(held) = self.held.lock().unwrap().as_mut() {
            held.push(event);
            return;
        }
        self.tx.lock().unwrap().try_send(event).expect("transport channel full");
    }

    pub fn hold(&self) {
        *self.held.lock().unwrap() = Some(Vec::new());
    }

    /// Deliver everything held back, in order, and stop holding.
    pub fn release(&self) {
        let held = self.held.lock().unwrap().take().unwrap_or_default();
        for event in held {
            self.emit(event);
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn set_position_secs(&self, secs: u64) {
        self.position_secs.store(secs, Ordering::SeqCst);
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlaybackEngine for MockEngine {
    fn prepare(&self, audio_uri: &str, video_uri: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Prepare(audio_uri.into(), video_uri.into()));
        self.prepared.store(true, Ordering::SeqCst);
        self.emit(TransportEvent::Buffering);
        let wants_to_play = self.play_when_ready.load(Ordering::SeqCst);
        self.emit(TransportEvent::Ready { wants_to_play });
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Play);
        self.play_when_ready.store(true, Ordering::SeqCst);
        if self.prepared.load(Ordering::SeqCst) {
            self.emit(TransportEvent::Ready { wants_to_play: true });
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Pause);
        self.play_when_ready.store(false, Ordering::SeqCst);
        if self.prepared.load(Ordering::SeqCst) {
            self.emit(TransportEvent::Ready { wants_to_play: false });
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Stop);
        self.play_when_ready.store(false, Ordering::SeqCst);
        if self.prepared.swap(false, Ordering::SeqCst) {
            self.emit(TransportEvent::Idle);
        }
        Ok(())
    }

    fn seek_to(&self, position_secs: u64) -> Result<(), EngineError> {
        self.record(EngineCall::Seek(position_secs));
        Ok(())
    }

    fn current_position_secs(&self) -> u64 {
        self.position_secs.load(Ordering::SeqCst)
    }

    fn duck(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Duck);
        Ok(())
    }

    fn unduck(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Unduck);
        Ok(())
    }

    fn listen_to_transport_events(&self) -> Result<TransportEventStream, EngineError> {
        self.rx.lock().unwrap().take().ok_or(EngineError::Internal("already listening".into()))
    }
}

pub struct MockFocusHost {
    grant: AtomicBool,
    requests: AtomicUsize,
    abandons: AtomicUsize,
    tx: Mutex<Sender<FocusChange>>,
    rx: Mutex<Option<FocusChangeStream>>,
}

impl MockFocusHost {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = channel(64);
        Arc::new(Self {
            grant: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
            tx: Mutex::new(tx),
            rx: Mutex::new(Some(rx)),
        })
    }

    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn emit(&self, change: FocusChange) {
        self.tx.lock().unwrap().try_send(change).expect("focus channel full");
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandons(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }
}

impl AudioFocusHost for MockFocusHost {
    fn request_focus(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.grant.load(Ordering::SeqCst)
    }

    fn abandon_focus(&self) {
        self.abandons.fetch_add(1, Ordering::SeqCst);
    }

    fn listen_to_focus_changes(&self) -> Result<FocusChangeStream, FocusError> {
        self.rx.lock().unwrap().take().ok_or(FocusError::Host("already listening".into()))
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(PlaybackState, Option<MediaDescriptor>)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.events.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn events(&self) -> Vec<(PlaybackState, Option<MediaDescriptor>)> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl PlaybackObserver for RecordingObserver {
    async fn on_state_changed(&self, state: PlaybackState, metadata: Option<&MediaDescriptor>) {
        self.events.lock().unwrap().push((state, metadata.cloned()));
    }
}

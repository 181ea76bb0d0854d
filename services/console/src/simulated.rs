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

//! Stand-ins for the host audio stack: a resolver with configurable latency,
//! an engine that buffers, plays and ends on a wall clock, and a focus host
//! whose changes are typed at the console.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc::{channel, Receiver, Sender};
use log::{debug, info, warn};
use playback_core::{
    AudioFocusHost, EngineError, FocusChange, FocusChangeStream, FocusError, MediaResolver,
    PlaybackEngine, ResolveError, ResolvedMedia, TransportEvent, TransportEventStream,
};
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub resolve_delay: Duration,
    pub buffer_delay: Duration,
    pub duration_secs: u64,
    pub failing_media: HashSet<String>,
    pub grant_focus: bool,
}

pub struct SimulatedResolver {
    delay: Duration,
    duration_secs: u64,
    failing_media: HashSet<String>,
}

impl SimulatedResolver {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            delay: settings.resolve_delay,
            duration_secs: settings.duration_secs,
            failing_media: settings.failing_media.clone(),
        }
    }
}

#[async_trait]
impl MediaResolver for SimulatedResolver {
    async fn resolve(&self, media_id: &str) -> Result<ResolvedMedia, ResolveError> {
        debug!("Resolving {} in {:?}", media_id, self.delay);
        sleep(self.delay).await;
        if self.failing_media.contains(media_id) {
            return Err(ResolveError::NoStream(media_id.to_string()));
        }
        Ok(ResolvedMedia {
            audio_uri: format!("sim://{}/audio", media_id),
            video_uri: format!("sim://{}/video", media_id),
            title: format!("Simulated track {}", media_id),
            duration_ms: self.duration_secs * 1000,
            artwork_url: format!("sim://{}/artwork.jpg", media_id),
        })
    }
}

/// Position of the loaded track, advancing only while running.
#[derive(Debug, Default)]
struct PlayClock {
    offset: Duration,
    running_since: Option<Instant>,
}

impl PlayClock {
    fn position(&self) -> Duration {
        self.offset + self.running_since.map(|since| since.elapsed()).unwrap_or_default()
    }

    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn halt(&mut self) {
        self.offset = self.position();
        self.running_since = None;
    }

    fn set(&mut self, position: Duration) {
        self.offset = position;
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    loaded: bool,
    ready: bool,
    play_when_ready: bool,
    ducked: bool,
    // bumped whenever a scheduled buffering-done or track-end becomes obsolete
    generation: u64,
    clock: PlayClock,
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    BufferingDone,
    TrackEnd,
}

struct EngineInner {
    buffer_delay: Duration,
    duration: Duration,
    state: Mutex<EngineState>,
    events: Mutex<Sender<TransportEvent>>,
}

impl EngineInner {
    fn emit(&self, event: TransportEvent) {
        if let Err(e) = self.events.lock().unwrap().try_send(event) {
            warn!("Dropping transport event: {}", e);
        }
    }

    fn schedule(self: &Arc<Self>, generation: u64, delay: Duration, timer: Timer) {
        let inner = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            inner.fire(generation, timer);
        });
    }

    fn schedule_track_end(self: &Arc<Self>, state: &mut EngineState) {
        state.generation += 1;
        let remaining = self.duration.saturating_sub(state.clock.position());
        self.schedule(state.generation, remaining, Timer::TrackEnd);
    }

    fn fire(self: &Arc<Self>, generation: u64, timer: Timer) {
        let mut state = self.state.lock().unwrap();
        if state.generation != generation {
            return;
        }
        match timer {
            Timer::BufferingDone => {
                state.ready = true;
                if state.play_when_ready {
                    state.clock.start();
                    self.schedule_track_end(&mut state);
                }
                self.emit(TransportEvent::Ready { wants_to_play: state.play_when_ready });
            }
            Timer::TrackEnd => {
                state.clock.halt();
                state.play_when_ready = false;
                info!("Simulated track reached its end");
                self.emit(TransportEvent::Ended);
            }
        }
    }
}

/// Engine whose track advances with the monotonic clock once playing.
pub struct SimulatedEngine {
    inner: Arc<EngineInner>,
    receiver: Mutex<Option<Receiver<TransportEvent>>>,
}

impl SimulatedEngine {
    pub fn new(settings: &SimulationSettings, capacity: usize) -> Self {
        let (tx, rx) = channel(capacity);
        Self {
            inner: Arc::new(EngineInner {
                buffer_delay: settings.buffer_delay,
                duration: Duration::from_secs(settings.duration_secs),
                state: Mutex::new(EngineState::default()),
                events: Mutex::new(tx),
            }),
            receiver: Mutex::new(Some(rx)),
        }
    }

    /// Report the track as finished right now.
    pub fn finish_track(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.generation += 1;
        state.clock.halt();
        state.play_when_ready = false;
        self.inner.emit(TransportEvent::Ended);
    }

    /// Report an internal engine error.
    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.inner.state.lock().unwrap();
        state.generation += 1;
        state.clock.halt();
        self.inner.emit(TransportEvent::Error(reason.into()));
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn prepare(&self, audio_uri: &str, video_uri: &str) -> Result<(), EngineError> {
        if audio_uri.is_empty() {
            let reason = format!("no audio stream (video: {})", video_uri);
            return Err(EngineError::InvalidSource(reason));
        }
        info!("Engine preparing {}", audio_uri);
        let mut state = self.inner.state.lock().unwrap();
        state.loaded = true;
        state.ready = false;
        state.clock = PlayClock::default();
        state.generation += 1;
        self.inner.emit(TransportEvent::Buffering);
        self.inner.schedule(state.generation, self.inner.buffer_delay, Timer::BufferingDone);
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        let mut state = self.inner.state.lock().unwrap();
        if !state.loaded {
            return Err(EngineError::Internal("nothing prepared".to_string()));
        }
        state.play_when_ready = true;
        if state.ready {
            state.clock.start();
            self.inner.schedule_track_end(&mut state);
            self.inner.emit(TransportEvent::Ready { wants_to_play: true });
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        let mut state = self.inner.state.lock().unwrap();
        state.play_when_ready = false;
        if state.ready {
            state.generation += 1;
            state.clock.halt();
            self.inner.emit(TransportEvent::Ready { wants_to_play: false });
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        let mut state = self.inner.state.lock().unwrap();
        let was_loaded = state.loaded;
        let ducked = state.ducked;
        *state = EngineState { generation: state.generation + 1, ducked, ..EngineState::default() };
        if was_loaded {
            self.inner.emit(TransportEvent::Idle);
        }
        Ok(())
    }

    fn seek_to(&self, position_secs: u64) -> Result<(), EngineError> {
        let mut state = self.inner.state.lock().unwrap();
        if !state.loaded {
            return Err(EngineError::Internal("nothing prepared".to_string()));
        }
        let position = Duration::from_secs(position_secs).min(self.inner.duration);
        state.clock.set(position);
        if state.ready && state.clock.running_since.is_some() {
            self.inner.schedule_track_end(&mut state);
        }
        Ok(())
    }

    fn current_position_secs(&self) -> u64 {
        let state = self.inner.state.lock().unwrap();
        state.clock.position().min(self.inner.duration).as_secs()
    }

    fn duck(&self) -> Result<(), EngineError> {
        info!("Engine volume ducked");
        self.inner.state.lock().unwrap().ducked = true;
        Ok(())
    }

    fn unduck(&self) -> Result<(), EngineError> {
        info!("Engine volume restored");
        self.inner.state.lock().unwrap().ducked = false;
        Ok(())
    }

    fn listen_to_transport_events(&self) -> Result<TransportEventStream, EngineError> {
        self.receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| EngineError::Internal("transport events already taken".to_string()))
    }
}

/// Focus host that grants or refuses every request and relays injected changes.
pub struct SimulatedFocusHost {
    grant: bool,
    events: Mutex<Sender<FocusChange>>,
    receiver: Mutex<Option<Receiver<FocusChange>>>,
}

impl SimulatedFocusHost {
    pub fn new(grant: bool, capacity: usize) -> Self {
        let (tx, rx) = channel(capacity);
        Self { grant, events: Mutex::new(tx), receiver: Mutex::new(Some(rx)) }
    }

    pub fn inject(&self, change: FocusChange) {
        if let Err(e) = self.events.lock().unwrap().try_send(change) {
            warn!("Dropping focus change: {}", e);
        }
    }
}

impl AudioFocusHost for SimulatedFocusHost {
    fn request_focus(&self) -> bool {
        info!("Focus requested: {}", if self.grant { "granted" } else { "denied" });
        self.grant
    }

    fn abandon_focus(&self) {
        info!("Focus abandoned");
    }

    fn listen_to_focus_changes(&self) -> Result<FocusChangeStream, FocusError> {
        self.receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| FocusError::Host("focus changes already taken".to_string()))
    }
}

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

use log::{debug, warn};

use crate::definitions::{engine_secs_to_ms, ms_to_engine_secs, StreamUris, TransportEvent};
use crate::errors::EngineError;

pub type TransportEventStream = futures::channel::mpsc::Receiver<TransportEvent>;

/// External playback engine.
///
/// Commands must return promptly; their effect is reported later through
/// the transport stream, never assumed from the call returning `Ok`.
/// Notifications are delivered in the order they were caused, and stopping
/// a prepared engine is acknowledged by exactly one [`TransportEvent::Idle`].
/// Positions are expressed in whole seconds.
pub trait PlaybackEngine: Send + Sync {
    fn prepare(&self, audio_uri: &str, video_uri: &str) -> Result<(), EngineError>;

    fn play(&self) -> Result<(), EngineError>;

    fn pause(&self) -> Result<(), EngineError>;

    fn stop(&self) -> Result<(), EngineError>;

    fn seek_to(&self, position_secs: u64) -> Result<(), EngineError>;

    fn current_position_secs(&self) -> u64;

    fn duck(&self) -> Result<(), EngineError> {
        Err(EngineError::FeatureNotSupported)
    }

    fn unduck(&self) -> Result<(), EngineError> {
        Err(EngineError::FeatureNotSupported)
    }

    /// Hand out the transport notification stream. Called once per session.
    fn listen_to_transport_events(&self) -> Result<TransportEventStream, EngineError>;
}

/// Session-side wrapper of the engine: unit conversion, failure logging and
/// recognition of notifications that belong to a source already stopped.
pub struct EngineAdapter {
    engine: Arc<dyn PlaybackEngine>,
    prepared: bool,
    // stops of a prepared engine whose Idle has not been seen yet
    unacknowledged_stops: u32,
}

impl EngineAdapter {
    pub fn new(engine: Arc<dyn PlaybackEngine>) -> Self {
        Self {
            engine,
            prepared: false,
            unacknowledged_stops: 0,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Whether `event` was caused by a source stopped since. Everything the
    /// engine reports up to the Idle acknowledging a stop is stale.
    pub fn discard_stale(&mut self, event: &TransportEvent) -> bool {
        if self.unacknowledged_stops == 0 {
            if *event == TransportEvent::Idle {
                // idled on its own: a later stop will not be acknowledged
                self.prepared = false;
            }
            return false;
        }
        if *event == TransportEvent::Idle {
            self.unacknowledged_stops -= 1;
        }
        true
    }

    pub fn listen(&self) -> Result<TransportEventStream, EngineError> {
        self.engine.listen_to_transport_events()
    }

    pub fn prepare(&mut self, uris: &StreamUris) -> Result<(), EngineError> {
        debug!("Engine prepare: audio={} video={}", uris.audio, uris.video);
        self.engine.prepare(&uris.audio, &uris.video)?;
        self.prepared = true;
        Ok(())
    }

    pub fn play(&self) -> Result<(), EngineError> {
        self.engine.play()
    }

    pub fn pause(&self) -> Result<(), EngineError> {
        self.engine.pause()
    }

    /// Stop never fails from the session's point of view.
    pub fn stop(&mut self) {
        if std::mem::take(&mut self.prepared) {
            self.unacknowledged_stops += 1;
        }
        if let Err(e) = self.engine.stop() {
            warn!("Engine stop failed: {}", e);
        }
    }

    /// `position_ms` must already be clamped to the media duration.
    pub fn seek_ms(&self, position_ms: u64) -> Result<(), EngineError> {
        let secs = ms_to_engine_secs(position_ms);
        debug!("Engine seek to {}s ({}ms requested)", secs, position_ms);
        self.engine.seek_to(secs)
    }

    pub fn position_ms(&self) -> u64 {
        engine_secs_to_ms(self.engine.current_position_secs())
    }

    /// Returns whether the engine actually lowered its volume.
    pub fn duck(&self) -> bool {
        match self.engine.duck() {
            Ok(()) => true,
            Err(e) => {
                warn!("Engine cannot duck: {}", e);
                false
            }
        }
    }

    pub fn unduck(&self) {
        if let Err(e) = self.engine.unduck() {
            warn!("Engine cannot restore volume: {}", e);
        }
    }
}

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

use log::debug;

use crate::definitions::{DuckLevel, FocusChange};
use crate::errors::FocusError;

pub type FocusChangeStream = futures::channel::mpsc::Receiver<FocusChange>;

/// Host audio system arbitrating output between applications.
pub trait AudioFocusHost: Send + Sync {
    /// Synchronous grant or deny. Must answer promptly, without blocking I/O.
    fn request_focus(&self) -> bool;

    fn abandon_focus(&self);

    /// Focus changes and becoming-noisy notifications. They may arrive at
    /// any time, including while this session holds no focus.
    fn listen_to_focus_changes(&self) -> Result<FocusChangeStream, FocusError> {
        Err(FocusError::NotificationsUnsupported)
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct FocusState {
    pub has_focus: bool,
    pub duck_level: DuckLevel,
    /// Playback was active when focus was lost and should resume on regain.
    pub resume_on_regain: bool,
}

/// Focus notifications after translation, as the orchestrator consumes them.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusEvent {
    Gained,
    Lost { transient: bool, can_duck: bool },
    BecomingNoisy,
}

pub struct AudioFocusCoordinator {
    host: Arc<dyn AudioFocusHost>,
    state: FocusState,
    // a request reached the host and was not abandoned since
    registered: bool,
}

impl AudioFocusCoordinator {
    pub fn new(host: Arc<dyn AudioFocusHost>) -> Self {
        Self {
            host,
            state: FocusState::default(),
            registered: false,
        }
    }

    pub fn listen(&self) -> Result<FocusChangeStream, FocusError> {
        self.host.listen_to_focus_changes()
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn request_focus(&mut self) -> bool {
        if self.state.has_focus {
            return true;
        }
        let granted = self.host.request_focus();
        debug!("Audio focus request {}", if granted { "granted" } else { "denied" });
        if granted {
            self.registered = true;
            self.state.has_focus = true;
        }
        granted
    }

    /// Idempotent: the host hears about it once per granted request.
    pub fn abandon_focus(&mut self) {
        if self.registered {
            debug!("Abandoning audio focus");
            self.host.abandon_focus();
            self.registered = false;
        }
        self.state = FocusState::default();
    }

    /// Update the focus bookkeeping for a host notification. Returns `None`
    /// when the session never registered for focus.
    pub fn translate(&mut self, change: FocusChange) -> Option<FocusEvent> {
        if !self.registered {
            debug!("Ignoring {:?}, focus not held by this session", change);
            return None;
        }
        let event = match change {
            FocusChange::Gained => {
                self.state.has_focus = true;
                FocusEvent::Gained
            }
            FocusChange::Lost => {
                self.state.has_focus = false;
                FocusEvent::Lost { transient: false, can_duck: false }
            }
            FocusChange::LostTransient => {
                self.state.has_focus = false;
                FocusEvent::Lost { transient: true, can_duck: false }
            }
            FocusChange::LostTransientCanDuck => {
                FocusEvent::Lost { transient: true, can_duck: true }
            }
            FocusChange::BecomingNoisy => FocusEvent::BecomingNoisy,
        };
        Some(event)
    }

    pub fn set_duck_level(&mut self, level: DuckLevel) {
        self.state.duck_level = level;
    }

    pub fn set_resume_on_regain(&mut self, resume: bool) {
        self.state.resume_on_regain = resume;
    }

    /// Read and clear the resume flag.
    pub fn take_resume_on_regain(&mut self) -> bool {
        std::mem::take(&mut self.state.resume_on_regain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingHost {
        grant: AtomicBool,
        requests: AtomicUsize,
        abandons: AtomicUsize,
    }

    impl CountingHost {
        fn new(grant: bool) -> Arc<Self> {
            Arc::new(Self {
                grant: AtomicBool::new(grant),
                requests: AtomicUsize::new(0),
                abandons: AtomicUsize::new(0),
            })
        }
    }

    impl AudioFocusHost for CountingHost {
        fn request_focus(&self) -> bool {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.grant.load(Ordering::SeqCst)
        }
        fn abandon_focus(&self) {
            self.abandons.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn abandon_is_idempotent() {
        let host = CountingHost::new(true);
        let mut focus = AudioFocusCoordinator::new(host.clone());
        focus.abandon_focus();
        assert_eq!(host.abandons.load(Ordering::SeqCst), 0);

        assert!(focus.request_focus());
        focus.abandon_focus();
        focus.abandon_focus();
        assert_eq!(host.abandons.load(Ordering::SeqCst), 1);
        assert_eq!(focus.state(), FocusState::default());
    }

    #[test]
    fn held_focus_is_not_requested_twice() {
        let host = CountingHost::new(true);
        let mut focus = AudioFocusCoordinator::new(host.clone());
        assert!(focus.request_focus());
        assert!(focus.request_focus());
        assert_eq!(host.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_request_leaves_state_untouched() {
        let host = CountingHost::new(false);
        let mut focus = AudioFocusCoordinator::new(host.clone());
        assert!(!focus.request_focus());
        assert!(!focus.state().has_focus);
        // no focus registered, so later notifications are no-ops
        assert_eq!(focus.translate(FocusChange::Gained), None);
    }

    #[test]
    fn notifications_without_focus_are_ignored() {
        let mut focus = AudioFocusCoordinator::new(CountingHost::new(true));
        assert_eq!(focus.translate(FocusChange::Lost), None);
        assert_eq!(focus.translate(FocusChange::BecomingNoisy), None);
    }

    #[test]
    fn translation_tracks_focus_ownership() {
        let mut focus = AudioFocusCoordinator::new(CountingHost::new(true));
        focus.request_focus();

        assert_eq!(
            focus.translate(FocusChange::LostTransientCanDuck),
            Some(FocusEvent::Lost { transient: true, can_duck: true })
        );
        assert!(focus.state().has_focus);

        assert_eq!(
            focus.translate(FocusChange::LostTransient),
            Some(FocusEvent::Lost { transient: true, can_duck: false })
        );
        assert!(!focus.state().has_focus);

        assert_eq!(focus.translate(FocusChange::Gained), Some(FocusEvent::Gained));
        assert!(focus.state().has_focus);

        assert_eq!(
            focus.translate(FocusChange::Lost),
            Some(FocusEvent::Lost { transient: false, can_duck: false })
        );
        assert_eq!(focus.translate(FocusChange::BecomingNoisy), Some(FocusEvent::BecomingNoisy));
    }

    #[test]
    fn resume_flag_is_cleared_when_taken() {
        let mut focus = AudioFocusCoordinator::new(CountingHost::new(true));
        focus.set_resume_on_regain(true);
        assert!(focus.take_resume_on_regain());
        assert!(!focus.take_resume_on_regain());
    }
}

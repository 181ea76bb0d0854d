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

use async_trait::async_trait;

use crate::definitions::PlaybackState;
use crate::session_state::{MediaDescriptor, SessionSnapshot};

/// Consumer of committed state changes (overlay view, system notification).
#[async_trait]
pub trait PlaybackObserver: Send + Sync + 'static {
    async fn on_state_changed(&self, state: PlaybackState, metadata: Option<&MediaDescriptor>);
}

/// Ordered observer collection. Insertion order is the fan-out order and
/// identity is the `Arc` pointer, so registering the same observer twice
/// delivers every notification to it twice.
#[derive(Default)]
pub struct SubscriberSet {
    observers: Vec<Arc<dyn PlaybackObserver>>,
}

fn same_observer(a: &Arc<dyn PlaybackObserver>, b: &Arc<dyn PlaybackObserver>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn PlaybackObserver>) {
        self.observers.push(observer);
    }

    /// Remove the earliest registration of `observer`. Returns whether one was found.
    pub fn remove(&mut self, observer: &Arc<dyn PlaybackObserver>) -> bool {
        match self.observers.iter().position(|o| same_observer(o, observer)) {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub async fn notify(&self, snapshot: &SessionSnapshot) {
        for observer in &self.observers {
            observer.on_state_changed(snapshot.state, snapshot.metadata.as_ref()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, PlaybackState)>>>,
    }

    #[async_trait]
    impl PlaybackObserver for Recorder {
        async fn on_state_changed(
            &self,
            state: PlaybackState,
            _metadata: Option<&MediaDescriptor>,
        ) {
            self.log.lock().unwrap().push((self.name, state));
        }
    }

    fn snapshot(state: PlaybackState) -> SessionSnapshot {
        SessionSnapshot { state, ..Default::default() }
    }

    #[tokio::test]
    async fn fan_out_follows_insertion_order_with_duplicates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Arc<dyn PlaybackObserver> = Arc::new(Recorder { name: "a", log: log.clone() });
        let b: Arc<dyn PlaybackObserver> = Arc::new(Recorder { name: "b", log: log.clone() });
        let mut set = SubscriberSet::new();
        set.add(a.clone());
        set.add(b.clone());
        set.add(a.clone());

        set.notify(&snapshot(PlaybackState::Buffering)).await;
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("a", PlaybackState::Buffering),
                ("b", PlaybackState::Buffering),
                ("a", PlaybackState::Buffering)
            ]
        );
    }

    #[tokio::test]
    async fn remove_drops_one_registration_at_a_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Arc<dyn PlaybackObserver> = Arc::new(Recorder { name: "a", log: log.clone() });
        let stranger: Arc<dyn PlaybackObserver> =
            Arc::new(Recorder { name: "x", log: log.clone() });
        let mut set = SubscriberSet::new();
        set.add(a.clone());
        set.add(a.clone());

        assert!(!set.remove(&stranger));
        assert!(set.remove(&a));
        assert_eq!(set.len(), 1);
        set.notify(&snapshot(PlaybackState::Paused)).await;
        assert_eq!(*log.lock().unwrap(), vec![("a", PlaybackState::Paused)]);

        assert!(set.remove(&a));
        assert!(set.is_empty());
    }
}

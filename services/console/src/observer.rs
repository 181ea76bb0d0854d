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

use async_trait::async_trait;
use playback_core::{MediaDescriptor, PlaybackObserver, PlaybackState};

/// Echoes every committed state change to stdout.
pub struct PrintingObserver;

pub fn describe(state: PlaybackState, metadata: Option<&MediaDescriptor>) -> String {
    match metadata {
        Some(media) => format!(
            "{} | {} \"{}\" ({}s)",
            state,
            media.media_id,
            media.title,
            media.duration_ms / 1000
        ),
        None => state.to_string(),
    }
}

#[async_trait]
impl PlaybackObserver for PrintingObserver {
    async fn on_state_changed(&self, state: PlaybackState, metadata: Option<&MediaDescriptor>) {
        println!("> {}", describe(state, metadata));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playback_core::StreamUris;

    #[test]
    fn describes_state_with_and_without_media() {
        assert_eq!(describe(PlaybackState::Stopped, None), PlaybackState::Stopped.to_string());
        let media = MediaDescriptor {
            media_id: "abc".into(),
            title: "Song".into(),
            duration_ms: 61_500,
            artwork_url: String::new(),
            stream_uris: StreamUris::default(),
        };
        assert_eq!(
            describe(PlaybackState::Playing, Some(&media)),
            format!("{} | abc \"Song\" (61s)", PlaybackState::Playing)
        );
    }
}

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

/// Tunables of a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Chain a successful prepare into play once the engine is ready.
    pub auto_play_on_prepare: bool,
    /// Bound of the client command channel.
    pub command_capacity: usize,
    /// Bound collaborators should use for their notification channels.
    pub transport_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_play_on_prepare: true,
            command_capacity: 32,
            transport_capacity: 32,
        }
    }
}

impl SessionConfig {
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play_on_prepare = auto_play;
        self
    }
}

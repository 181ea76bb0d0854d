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
use log::debug;
use tokio::sync::mpsc;

use crate::definitions::StreamUris;
use crate::errors::ResolveError;
use crate::session_state::MediaDescriptor;

/// Monotonically increasing tag of a resolution request.
pub type ResolutionToken = u64;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolutionRequest {
    pub token: ResolutionToken,
    pub media_id: String,
}

/// Successful resolver answer: stream locations plus display metadata.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ResolvedMedia {
    pub audio_uri: String,
    pub video_uri: String,
    pub title: String,
    pub duration_ms: u64,
    pub artwork_url: String,
}

impl ResolvedMedia {
    pub fn into_descriptor(self, media_id: String) -> MediaDescriptor {
        MediaDescriptor {
            media_id,
            title: self.title,
            duration_ms: self.duration_ms,
            artwork_url: self.artwork_url,
            stream_uris: StreamUris {
                audio: self.audio_uri,
                video: self.video_uri,
            },
        }
    }
}

/// Terminal result of one request, tagged with the request it answers.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub request: ResolutionRequest,
    pub result: Result<ResolvedMedia, ResolveError>,
}

/// External lookup turning a media identifier into playable streams.
///
/// Implementations may run concurrent lookups; the session decides which
/// answer is still wanted.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, media_id: &str) -> Result<ResolvedMedia, ResolveError>;
}

/// Starts resolutions in the background and delivers exactly one
/// [`ResolutionOutcome`] per request onto the session's result channel.
///
/// No retries happen here. Supersession is the orchestrator's business:
/// it compares tokens when outcomes arrive.
pub struct ResolverAdapter {
    resolver: Arc<dyn MediaResolver>,
    results_tx: mpsc::UnboundedSender<ResolutionOutcome>,
    last_token: ResolutionToken,
}

impl ResolverAdapter {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        results_tx: mpsc::UnboundedSender<ResolutionOutcome>,
    ) -> Self {
        Self {
            resolver,
            results_tx,
            last_token: 0,
        }
    }

    /// Allocate a request with a token greater than every previous one.
    pub fn next_request(&mut self, media_id: &str) -> ResolutionRequest {
        self.last_token += 1;
        ResolutionRequest {
            token: self.last_token,
            media_id: media_id.to_string(),
        }
    }

    pub fn resolve(&self, request: ResolutionRequest) {
        let resolver = self.resolver.clone();
        let results_tx = self.results_tx.clone();
        let media_id = request.media_id.clone();
        let lookup = tokio::spawn(async move { resolver.resolve(&media_id).await });
        tokio::spawn(async move {
            // A panicking resolver still owes the session an answer.
            let result = match lookup.await {
                Ok(result) => result,
                Err(e) => Err(ResolveError::Unavailable(format!("resolver task failed: {}", e))),
            };
            let token = request.token;
            if results_tx.send(ResolutionOutcome { request, result }).is_err() {
                debug!("Session gone, dropping resolution result for token {}", token);
            }
        });
    }
}

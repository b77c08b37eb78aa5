//! Replaying adapter for the `Transport` port.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use crate::cassette::format::{InteractionEntry, RecordedResponse};
use crate::error::CassetteError;
use crate::ports::transport::{
    RequestContext, RequestOptions, Transport, TransportFuture, TransportResponse,
};

/// Method reported in diagnostics when the caller did not name one.
pub const UNDEFINED_METHOD: &str = "UNDEFINED";

/// Serves recorded responses strictly in recorded order.
///
/// Replay is positional: the URL and body of each call are never compared
/// with the recording. The n-th call gets the n-th entry.
pub struct PlaybackQueue {
    entries: Mutex<VecDeque<InteractionEntry>>,
}

impl PlaybackQueue {
    /// Create a queue that will serve `entries` front to back.
    #[must_use]
    pub fn new(entries: Vec<InteractionEntry>) -> Self {
        Self { entries: Mutex::new(entries.into()) }
    }

    /// Number of entries not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.lock().expect("playback queue lock poisoned").len()
    }

    fn next_entry(&self) -> Option<InteractionEntry> {
        self.entries.lock().expect("playback queue lock poisoned").pop_front()
    }
}

impl Transport for PlaybackQueue {
    fn exchange<'a>(
        &'a self,
        url: &'a str,
        options: &'a RequestOptions,
        context: &'a RequestContext,
    ) -> TransportFuture<'a> {
        let next = self.next_entry();
        Box::pin(async move {
            let entry = next.ok_or_else(|| CassetteError::QueueExhausted {
                url: url.to_string(),
                description: context.description.clone(),
            })?;

            let method = options.method.as_deref().unwrap_or(UNDEFINED_METHOD);
            debug!(
                method,
                url,
                recorded_url = %entry.request.url,
                status = entry.response.status,
                "replaying interaction"
            );

            Ok(replayed_response(&entry.response))
        })
    }
}

fn replayed_response(recorded: &RecordedResponse) -> TransportResponse {
    let mut headers = Vec::new();
    if let Some(content_type) = &recorded.content_type {
        headers.push(("Content-Type".to_string(), content_type.clone()));
    }
    if let Some(location) = &recorded.content_location {
        headers.push(("Content-Location".to_string(), location.clone()));
    }
    TransportResponse {
        status: recorded.status,
        headers,
        body: recorded.body.clone().unwrap_or_default(),
    }
}

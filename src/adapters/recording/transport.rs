//! Recording adapter for the `Transport` port.

use crate::cassette::format::{InteractionEntry, RecordedRequest, RecordedResponse};
use crate::cassette::store::SharedStore;
use crate::error::Result;
use crate::ports::transport::{
    RequestContext, RequestOptions, Transport, TransportFuture, TransportResponse,
};

/// Records every exchange into a cassette store while delegating to an inner transport.
pub struct RecordingTransport {
    inner: Box<dyn Transport>,
    store: SharedStore,
    origin: Option<String>,
}

impl RecordingTransport {
    /// Creates a recording transport wrapping `inner`. URLs starting with
    /// `origin` are stored relative to it.
    pub fn new(inner: Box<dyn Transport>, store: SharedStore, origin: Option<String>) -> Self {
        Self { inner, store, origin }
    }

    fn persist(&self, entry: InteractionEntry) -> Result<()> {
        let mut store = self.store.lock().expect("cassette store lock poisoned");
        store.append(entry)
    }
}

/// Strip a shared origin from `url`, keeping the leading `/`.
#[must_use]
pub fn strip_origin(url: &str, origin: Option<&str>) -> String {
    let Some(origin) = origin.map(|o| o.trim_end_matches('/')).filter(|o| !o.is_empty()) else {
        return url.to_string();
    };
    match url.strip_prefix(origin) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with(&['/', '?'][..]) => rest.to_string(),
        _ => url.to_string(),
    }
}

impl Transport for RecordingTransport {
    fn exchange<'a>(
        &'a self,
        url: &'a str,
        options: &'a RequestOptions,
        context: &'a RequestContext,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let response = self.inner.exchange(url, options, context).await?;

            let entry = InteractionEntry {
                request: RecordedRequest {
                    method: options.wire_method().to_string(),
                    url: strip_origin(url, self.origin.as_deref()),
                    description: context.description.clone(),
                    body: options.body.clone(),
                    decoded_body: None,
                },
                response: recorded_response(&response),
            };
            self.persist(entry)?;

            Ok(response)
        })
    }
}

fn recorded_response(response: &TransportResponse) -> RecordedResponse {
    RecordedResponse {
        status: response.status,
        body: Some(response.body.clone()).filter(|b| !b.is_empty()),
        content_type: response.header("Content-Type").map(str::to_string),
        content_location: response.header("Content-Location").map(str::to_string),
        decoded_body: None,
    }
}

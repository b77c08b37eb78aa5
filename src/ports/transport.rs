//! Transport port: the single entry point the resource client calls.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::error::{CassetteError, Result};

/// Boxed future type alias used by [`Transport`] to keep the trait dyn-compatible.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse>> + Send + 'a>>;

/// Method sent when the caller did not name one.
pub const DEFAULT_METHOD: &str = "GET";

/// Options describing one outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// HTTP method; `None` means [`DEFAULT_METHOD`] on the wire.
    pub method: Option<String>,
    /// Request headers in sending order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
}

impl RequestOptions {
    /// Options for a bodiless request with the given method.
    pub fn method(method: impl Into<String>) -> Self {
        Self { method: Some(method.into()), ..Self::default() }
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The method that goes on the wire.
    #[must_use]
    pub fn wire_method(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_METHOD)
    }
}

/// Caller-supplied context used only for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Human-readable description of what the request does.
    pub description: String,
}

impl RequestContext {
    /// Context with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

/// A response as seen by the resource client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body text.
    pub body: String,
}

impl TransportResponse {
    /// First value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Performs requests against the storage service, live or replayed.
///
/// Callers use [`Transport::send`]; implementors provide
/// [`Transport::exchange`]. The status check lives in `send` so every
/// implementation fails the same way.
pub trait Transport: Send + Sync {
    /// Perform one exchange and return the response whatever its status.
    fn exchange<'a>(
        &'a self,
        url: &'a str,
        options: &'a RequestOptions,
        context: &'a RequestContext,
    ) -> TransportFuture<'a>;

    /// Perform one exchange and require its status to be in `acceptable`.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::UnexpectedStatus`] for any other status, or
    /// whatever [`Transport::exchange`] fails with.
    fn send<'a>(
        &'a self,
        url: &'a str,
        options: &'a RequestOptions,
        acceptable: &'a [u16],
        context: &'a RequestContext,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let response = self.exchange(url, options, context).await?;
            ensure_acceptable(response, acceptable, options, context)
        })
    }
}

/// Pass `response` through if its status is acceptable.
///
/// # Errors
///
/// Returns [`CassetteError::UnexpectedStatus`] carrying request and response
/// bodies for diagnostics.
pub fn ensure_acceptable(
    response: TransportResponse,
    acceptable: &[u16],
    options: &RequestOptions,
    context: &RequestContext,
) -> Result<TransportResponse> {
    if acceptable.contains(&response.status) {
        return Ok(response);
    }
    warn!(
        status = response.status,
        expected = ?acceptable,
        description = %context.description,
        "unexpected response status"
    );
    Err(CassetteError::UnexpectedStatus {
        status: response.status,
        expected: acceptable.to_vec(),
        description: context.description.clone(),
        request_body: options.body.clone(),
        response_body: Some(response.body),
    })
}

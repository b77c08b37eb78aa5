//! Live adapter for the `Transport` port using `reqwest`.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use tracing::{debug, info};

use crate::error::CassetteError;
use crate::ports::transport::{
    RequestContext, RequestOptions, Transport, TransportFuture, TransportResponse,
};

/// Live transport that performs real HTTP calls.
pub struct LiveTransport {
    client: Client,
    log_traffic: bool,
}

impl LiveTransport {
    /// Creates a live transport. With `log_traffic`, every exchange is logged
    /// at `info` including both bodies.
    #[must_use]
    pub fn new(log_traffic: bool) -> Self {
        Self { client: Client::new(), log_traffic }
    }

    /// Creates a live transport around an already configured client
    /// (credentials, timeouts, proxies).
    #[must_use]
    pub fn with_client(client: Client, log_traffic: bool) -> Self {
        Self { client, log_traffic }
    }
}

impl Default for LiveTransport {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Transport for LiveTransport {
    fn exchange<'a>(
        &'a self,
        url: &'a str,
        options: &'a RequestOptions,
        context: &'a RequestContext,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let method = Method::from_bytes(options.wire_method().as_bytes()).map_err(|e| {
                CassetteError::InvalidRequest(format!("method {:?}: {e}", options.wire_method()))
            })?;

            let mut request = self.client.request(method, url);
            for (name, value) in &options.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &options.body {
                request = request.body(body.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|source| CassetteError::Http { url: url.to_string(), source })?;

            let status = response.status().as_u16();
            let headers = response_headers(response.headers());
            let body = response
                .text()
                .await
                .map_err(|source| CassetteError::Http { url: url.to_string(), source })?;

            if self.log_traffic {
                info!(
                    method = options.wire_method(),
                    url,
                    status,
                    description = %context.description,
                    request_body = ?options.body,
                    response_body = %body,
                    "transport exchange"
                );
            } else {
                debug!(method = options.wire_method(), url, status, "transport exchange");
            }

            Ok(TransportResponse { status, headers, body })
        })
    }
}

/// Copy response headers, skipping values that are not valid UTF-8.
fn response_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

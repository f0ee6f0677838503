//! Executes `HttpRequest`s.
//!
//! The client core only builds requests and parses responses; a `Transport`
//! sits between the two and does the I/O. `UreqTransport` is the blocking
//! network implementation. Tests substitute their own.

use std::time::Duration;

use tracing::debug;

use crate::error::{RequestError, Result};
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    /// Perform the round-trip. Any HTTP status is a successful return; only
    /// failures to obtain a response are errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Status-as-error is disabled so 4xx/5xx responses come back as data
    /// for the client core to interpret.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in request.query.iter() {
            builder = builder.query(name, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        debug!(url = %request.url, status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

//! The request client capability and its HTTP implementation.
//!
//! # Design
//! Accessors only need three things from a client: the API key, a way to
//! issue a request against a templated path, and the session-level variant
//! some endpoints were historically called through. `RequestClient` is that
//! capability; `User` is generic over it so tests inject a fake.
//!
//! `GoodreadsClient` keeps the host-does-IO split: `build_request` produces
//! an `HttpRequest`, a `Transport` performs it, and `parse_response` turns
//! the `HttpResponse` into a `Record`. It holds no mutable state.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{GoodreadsError, RequestError, Result};
use crate::http::{HttpRequest, HttpResponse, Query};
use crate::record::Record;
use crate::transport::{Transport, UreqTransport};
use crate::user::User;
use crate::xml;

/// Root element every Goodreads XML response is wrapped in.
const RESPONSE_ROOT: &str = "GoodreadsResponse";

/// Issues authenticated requests and decodes their responses.
pub trait RequestClient {
    /// API key sent with requests that carry it in the payload.
    fn client_key(&self) -> &str;

    /// Request `path` (relative to the API root) with `query`.
    fn request(&self, path: &str, query: &Query) -> Result<Record>;

    /// Session-level request. Equivalent to `request` unless the client has a
    /// separate authenticated session.
    fn session_get(&self, path: &str, query: &Query) -> Result<Record> {
        self.request(path, query)
    }
}

/// Goodreads API client over a pluggable transport.
#[derive(Debug, Clone)]
pub struct GoodreadsClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl GoodreadsClient<UreqTransport> {
    /// Validate `config` and build a client on the blocking ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let transport = UreqTransport::new(config.timeout);
        Ok(Self { config, transport })
    }

    /// Build a client from `GOODREADS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> GoodreadsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the GET request for `path`. The API key is appended unless the
    /// payload already carries one.
    pub fn build_request(&self, path: &str, query: &Query) -> HttpRequest {
        let mut query = query.clone();
        if !query.contains("key") {
            query.push("key", &self.config.client_key);
        }
        HttpRequest {
            url: format!("{}/{}", self.config.base_url, path.trim_start_matches('/')),
            query,
            headers: vec![
                ("user-agent".to_string(), self.config.user_agent.clone()),
                ("accept".to_string(), "application/xml".to_string()),
            ],
        }
    }

    /// Check the status and decode the body, unwrapping `GoodreadsResponse`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Record> {
        check_status(&response)?;
        let document = xml::decode_document(&response.body)?;
        let mut root = Record::from_value(document)?;
        if root.contains(RESPONSE_ROOT) {
            root = root.record_at(&[RESPONSE_ROOT])?;
        }
        Ok(root)
    }

    /// Fetch a user by Goodreads id.
    pub fn user(&self, gid: &str) -> Result<User<'_, Self>> {
        let resp = self.request(&format!("user/show/{gid}.xml"), &Query::new())?;
        User::from_response(&resp, self)
    }

    /// Fetch a user by handle.
    pub fn user_by_name(&self, user_name: &str) -> Result<User<'_, Self>> {
        let resp = self.request("user/show.xml", &Query::new().with("username", user_name))?;
        User::from_response(&resp, self)
    }
}

impl<T: Transport> RequestClient for GoodreadsClient<T> {
    fn client_key(&self) -> &str {
        &self.config.client_key
    }

    fn request(&self, path: &str, query: &Query) -> Result<Record> {
        let request = self.build_request(path, query);
        debug!(url = %request.url, params = request.query.len(), "sending request");
        let response = self.transport.execute(&request)?;
        self.parse_response(response)
    }
}

/// Map non-200 statuses to the matching `RequestError`.
fn check_status(response: &HttpResponse) -> Result<()> {
    match response.status {
        200 => Ok(()),
        404 => {
            warn!(status = 404, "resource not found");
            Err(GoodreadsError::RemoteRequest(RequestError::NotFound))
        }
        status => {
            warn!(status, "request rejected");
            Err(GoodreadsError::RemoteRequest(RequestError::Status {
                status,
                body: response.body.clone(),
            }))
        }
    }
}

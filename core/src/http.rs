//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `GoodreadsClient` builds an
//! `HttpRequest`, hands it to a `Transport` for the actual round-trip, and
//! parses the `HttpResponse` it gets back. Only the transport touches the
//! network, so the building and parsing halves are tested without a server.
//!
//! Every Goodreads read endpoint is a GET with query parameters, so there is
//! no method or body field.

use std::fmt;

/// Ordered query parameters for one request.
///
/// Order is preserved so the outgoing URL is deterministic. Values are stored
/// already formatted as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Later duplicates are kept; the server decides.
    pub fn push(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    /// Builder-style `push`.
    pub fn with(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.push(name, value);
        self
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A GET request described as plain data.
///
/// Built by `GoodreadsClient::build_request`. A `Transport` executes it and
/// returns the corresponding `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub query: Query,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

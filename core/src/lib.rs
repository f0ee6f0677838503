//! Synchronous client for the Goodreads XML API.
//!
//! # Overview
//! A `User` is a read-only snapshot of a profile plus a borrowed request
//! client; its methods fetch the user's groups, shelves, shelf contents,
//! reviews, owned books and read status, one request per call. Responses are
//! XML, decoded into nested `Record` mappings and wrapped in thin typed
//! views (`Group`, `Shelf`, `Review`, `OwnedBook`, `Book`).
//!
//! # Design
//! - `RequestClient` is the injected capability. `GoodreadsClient` is the
//!   HTTP implementation; tests use their own.
//! - `GoodreadsClient` splits each call into `build_request` and
//!   `parse_response` around a `Transport`, so everything but the transport
//!   is testable without a network.
//! - All resource wrappers are one generic `Resource<K>` type.
//! - Lookups never default: missing fields and missing nesting are errors.
//!
//! ```no_run
//! use goodreads_core::{ClientConfig, GoodreadsClient, DEFAULT_PAGE};
//!
//! # fn main() -> goodreads_core::Result<()> {
//! let client = GoodreadsClient::new(ClientConfig::new("your-api-key"))?;
//! let user = client.user("1")?;
//! for group in user.list_groups(DEFAULT_PAGE)? {
//!     println!("{user} is in {group}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod record;
pub mod resource;
pub mod transport;
pub mod user;
pub mod xml;

pub use client::{GoodreadsClient, RequestClient};
pub use config::ClientConfig;
pub use error::{GoodreadsError, RequestError, Result};
pub use http::{HttpRequest, HttpResponse, Query};
pub use record::Record;
pub use resource::{Book, Group, OwnedBook, Resource, ResourceKind, Review, Shelf, UserProfile};
pub use transport::{Transport, UreqTransport};
pub use user::{ShelfQuery, User, DEFAULT_PAGE, GROUPS_PER_PAGE};

//! Remote catalog server access.
//!
//! [`Remote`] is the seam between the engine and the network: a header-only
//! revalidation request and a full body GET. Both are blocking; async callers
//! go through `spawn_blocking`. [`CurlRemote`] is the libcurl implementation.

mod client;
mod parse;

pub use client::{CurlRemote, HttpSettings};

use crate::retry::FetchError;

/// Change identifiers a server reports for the current version of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeIdentifiers {
    /// Opaque `ETag` value: quotes and any weak `W/` prefix removed.
    pub etag: Option<String>,
    /// `Last-Modified` value exactly as sent.
    pub last_modified: Option<String>,
}

/// Network operations the fetch engine needs.
pub trait Remote: Send + Sync + 'static {
    /// Metadata-only request. Must not transfer the resource body.
    fn head(&self, url: &str) -> Result<ChangeIdentifiers, FetchError>;

    /// Fetch the complete body of `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

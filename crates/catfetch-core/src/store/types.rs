//! Types held by the metadata store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable key of a remote distribution: `<dataset_id>::<url>`.
pub type Identity = String;

/// Last-known state of one remote distribution file.
///
/// Exists only after at least one successful download; the counts describe the
/// normalized table written by that download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Map key in the persisted file; not repeated inside the value.
    #[serde(skip)]
    pub identity: Identity,
    pub url: String,
    #[serde(rename = "filename")]
    pub local_filename: String,
    /// Entity tag observed at the last successful download.
    pub change_tag: Option<String>,
    /// `Last-Modified` string observed at the last successful download.
    pub modified_at: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub row_count: u64,
    pub column_count: u64,
}

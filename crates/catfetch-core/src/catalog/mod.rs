//! Catalog discovery: turn the remote dataset listing into candidate resources.
//!
//! One GET of the listing per run. Items are decoded into [`DatasetItem`];
//! malformed items are skipped with a warning, matching items contribute one
//! [`CandidateResource`] per CSV distribution.

mod filter;
mod model;

pub use filter::is_csv_url;
pub use model::{DatasetItem, Distribution};

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::remote::Remote;
use crate::retry::FetchError;
use crate::store::Identity;
use crate::url_model::{derive_csv_filename, sanitize_dataset_id};

/// A remote distribution file to check this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResource {
    /// `<dataset_id>::<url>`, unique within a run and across the store.
    pub identity: Identity,
    /// Filesystem-safe dataset id (directory under the data root).
    pub dataset_id: String,
    pub url: String,
    /// Filesystem-safe `.csv` filename inside the dataset directory.
    pub suggested_filename: String,
}

impl CandidateResource {
    pub fn new(dataset_id: &str, url: impl Into<String>, filename_hint: Option<&str>) -> Self {
        let dataset_id = sanitize_dataset_id(dataset_id);
        let url = url.into();
        Self {
            identity: format!("{}::{}", dataset_id, url),
            suggested_filename: derive_csv_filename(&url, filename_hint),
            dataset_id,
            url,
        }
    }

    /// Where the normalized table for this resource lives under `data_dir`.
    pub fn destination(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.dataset_id).join(&self.suggested_filename)
    }
}

/// Hex digits of the URL digest appended to a colliding filename.
const URL_TAG_LEN: usize = 8;

/// Give every candidate its own destination file.
///
/// Candidates of one dataset whose derived filenames coincide (e.g. the same
/// path with different query strings) all get `<stem>-<url tag>.csv`, where
/// the tag is a short SHA-256 of the URL. Renaming every member of a
/// colliding group keeps the result independent of listing order. Returns
/// the number of renamed candidates.
pub fn assign_unique_filenames(candidates: &mut [CandidateResource]) -> usize {
    let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
    for (i, c) in candidates.iter().enumerate() {
        groups
            .entry((c.dataset_id.clone(), c.suggested_filename.clone()))
            .or_default()
            .push(i);
    }

    let mut renamed = 0;
    for ((_, filename), members) in groups {
        if members.len() < 2 {
            continue;
        }
        for i in members {
            let c = &mut candidates[i];
            c.suggested_filename = tagged_filename(&filename, &c.url);
            tracing::debug!(
                identity = %c.identity,
                filename = %c.suggested_filename,
                "destination shared with another resource, renamed"
            );
            renamed += 1;
        }
    }
    renamed
}

fn tagged_filename(filename: &str, url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let tag = &digest[..URL_TAG_LEN];
    let stem = match filename.len().checked_sub(4) {
        Some(cut) if filename.is_char_boundary(cut) && filename[cut..].eq_ignore_ascii_case(".csv") => {
            &filename[..cut]
        }
        _ => filename,
    };
    format!("{}-{}.csv", stem, tag)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("fetch catalog listing {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("decode catalog listing: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog listing is neither an array nor an object with data/items/results")]
    UnexpectedShape,
    #[error("catalog listing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Items(Vec<serde_json::Value>),
    Wrapped {
        data: Option<Vec<serde_json::Value>>,
        items: Option<Vec<serde_json::Value>>,
        results: Option<Vec<serde_json::Value>>,
    },
}

/// Decode a listing body and return candidates for items matching `theme`.
pub fn parse_listing(body: &[u8], theme: &str) -> Result<Vec<CandidateResource>, CatalogError> {
    let raw_items = match serde_json::from_slice::<Listing>(body)? {
        Listing::Items(items) => items,
        Listing::Wrapped {
            data,
            items,
            results,
        } => data
            .or(items)
            .or(results)
            .ok_or(CatalogError::UnexpectedShape)?,
    };

    let total = raw_items.len();
    let mut matching = 0usize;
    let mut seen: HashSet<Identity> = HashSet::new();
    let mut candidates = Vec::new();

    for (index, raw) in raw_items.into_iter().enumerate() {
        let item: DatasetItem = match serde_json::from_value(raw) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(index, "skipping malformed catalog item: {}", e);
                continue;
            }
        };
        if !item.matches_theme(theme) {
            continue;
        }
        matching += 1;

        let dataset_id = item.raw_id().unwrap_or_default();
        let distributions = item.csv_distributions();
        if distributions.is_empty() {
            tracing::info!(dataset = %sanitize_dataset_id(&dataset_id), "no CSV distributions found");
            continue;
        }
        for (url, hint) in distributions {
            let candidate = CandidateResource::new(&dataset_id, url, hint);
            if seen.insert(candidate.identity.clone()) {
                candidates.push(candidate);
            } else {
                tracing::debug!(identity = %candidate.identity, "duplicate distribution ignored");
            }
        }
    }

    assign_unique_filenames(&mut candidates);

    tracing::info!(
        total,
        matching,
        candidates = candidates.len(),
        "found {} datasets matching theme {:?}",
        matching,
        theme
    );
    Ok(candidates)
}

/// Fetch the catalog listing and return candidate resources for `theme`.
pub async fn discover<R: Remote>(
    remote: Arc<R>,
    catalog_url: &str,
    theme: &str,
) -> Result<Vec<CandidateResource>, CatalogError> {
    tracing::info!(url = catalog_url, "fetching catalog listing");
    let url = catalog_url.to_string();
    let body = tokio::task::spawn_blocking(move || remote.get(&url))
        .await?
        .map_err(|source| CatalogError::Fetch {
            url: catalog_url.to_string(),
            source,
        })?;
    parse_listing(&body, theme)
}

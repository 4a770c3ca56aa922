//! Durable metadata store: one JSON file mapping resource identity to its
//! last-known change identifiers and table stats.
//!
//! `upsert` only touches memory. `persist` rewrites the whole mapping through a
//! `.part` file and a rename, so the file on disk is always one complete
//! version. Keys are kept sorted, which makes the output stable across runs.

mod types;


pub use types::{Identity, ResourceRecord};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::storage;

/// Failure to read or atomically write the store file. Fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read metadata store {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse metadata store {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize metadata store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write metadata store {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// In-memory mapping plus the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStore {
    path: PathBuf,
    records: BTreeMap<Identity, ResourceRecord>,
}

impl MetadataStore {
    /// An empty store that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Load the mapping from `path`. A missing file is an empty store; an
    /// unreadable or unparsable one is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no metadata store yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        let mut records: BTreeMap<Identity, ResourceRecord> = match serde_json::from_slice(&bytes)
        {
            Ok(r) => r,
            Err(source) => return Err(StoreError::Parse { path, source }),
        };
        for (identity, record) in records.iter_mut() {
            record.identity = identity.clone();
        }
        tracing::debug!(path = %path.display(), records = records.len(), "loaded metadata store");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, identity: &str) -> Option<&ResourceRecord> {
        self.records.get(identity)
    }

    /// Insert or replace the record under its identity (memory only).
    pub fn upsert(&mut self, record: ResourceRecord) {
        self.records.insert(record.identity.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in identity order.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.values()
    }

    /// Serialized form written by `persist`.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut json = serde_json::to_string_pretty(&self.records)?;
        json.push('\n');
        Ok(json)
    }

    /// Write the full mapping atomically (temp file + fsync + rename).
    pub fn persist(&self) -> Result<(), StoreError> {
        let json = self.to_json()?;
        storage::write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "persisted metadata store");
        Ok(())
    }
}

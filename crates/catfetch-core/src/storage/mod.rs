//! Disk I/O and file lifecycle.
//!
//! Every file this crate produces (normalized tables, the metadata store) is
//! written to a uniquely named `.part` sibling first and renamed into place,
//! so a reader of the data tree sees either the old file or the complete new
//! one, and two writers never share a staging file.

mod staged;

pub use staged::StagedFile;

use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of every staging file.
pub const TEMP_SUFFIX: &str = ".part";

/// Staging files left next to `final_path` (e.g. by a crashed writer).
pub fn staging_files(final_path: &Path) -> Vec<PathBuf> {
    let Some(name) = final_path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Vec::new();
    };
    let prefix = format!(".{}.", name);
    let dir = match final_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(TEMP_SUFFIX))
        })
        .collect()
}

/// Write `data` to `final_path` atomically (stage, fsync, rename).
pub fn write_atomic(final_path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut staged = StagedFile::create(final_path)?;
    staged.write_all(data)?;
    staged.commit()
}

//! `catfetch status` – list stored records.

use anyhow::{Context, Result};
use catfetch_core::store::MetadataStore;
use std::path::Path;

pub fn run_status(store_path: &Path) -> Result<()> {
    let store = MetadataStore::load(store_path)
        .with_context(|| format!("reading metadata store {}", store_path.display()))?;
    if store.is_empty() {
        println!("No records in {}.", store_path.display());
        return Ok(());
    }
    println!(
        "{:<28} {:<8} {:<6} {:<25} {}",
        "FILENAME", "ROWS", "COLS", "FETCHED", "IDENTITY"
    );
    for r in store.records() {
        println!(
            "{:<28} {:<8} {:<6} {:<25} {}",
            r.local_filename,
            r.row_count,
            r.column_count,
            r.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            r.identity
        );
    }
    Ok(())
}

//! `catfetch run` – discover datasets and fetch what changed.

use anyhow::Result;
use catfetch_core::config::FetchConfig;
use catfetch_core::{Orchestrator, RunError, RunStatus, RunSummary};

use crate::cli::{EXIT_FATAL, EXIT_PARTIAL, EXIT_SUCCESS};

pub async fn run_fetch(cfg: &FetchConfig) -> Result<i32> {
    tracing::info!(
        catalog = %cfg.catalog_url,
        theme = %cfg.theme,
        data_dir = %cfg.data_dir.display(),
        store = %cfg.store_path.display(),
        jobs = cfg.max_concurrent_downloads,
        "starting catfetch run"
    );
    let orchestrator = Orchestrator::from_config(cfg);
    match orchestrator.discover_and_run().await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(match summary.status() {
                RunStatus::Success => EXIT_SUCCESS,
                RunStatus::PartialFailure => EXIT_PARTIAL,
            })
        }
        Err(err @ RunError::Store(_)) => {
            tracing::error!("run aborted: {}", err);
            eprintln!("catfetch: run aborted, store left as it was: {}", err);
            Ok(EXIT_FATAL)
        }
        Err(err) => {
            tracing::error!("run aborted: {}", err);
            eprintln!("catfetch: {}", err);
            Ok(EXIT_FATAL)
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("{}", summary);
    if summary.bytes > 0 {
        println!("  {:.1} MiB downloaded", summary.bytes as f64 / 1_048_576.0);
    }
    if !summary.failures.is_empty() {
        println!("failures:");
        for f in &summary.failures {
            println!("  {:<40} {:<32} {}", f.identity, f.kind.to_string(), f.detail);
        }
    }
}

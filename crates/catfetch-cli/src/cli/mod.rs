//! CLI for the catfetch incremental dataset fetcher.

mod commands;

use anyhow::Result;
use catfetch_core::config::{self, FetchConfig};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_completions, run_fetch, run_man, run_status};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;

/// Top-level CLI for catfetch.
#[derive(Debug, Parser)]
#[command(name = "catfetch")]
#[command(about = "Incrementally fetch tabular datasets from a public data catalog", long_about = None)]
pub struct Cli {
    /// Config file to use instead of $XDG_CONFIG_HOME/catfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Discover matching datasets and download the ones that changed.
    Run {
        /// Theme to match (case-insensitive substring), e.g. "hospital".
        #[arg(long)]
        theme: Option<String>,
        /// Directory that receives the normalized CSV files.
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
        /// Metadata store file.
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
        /// Maximum simultaneous downloads.
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Catalog listing URL.
        #[arg(long, value_name = "URL")]
        catalog_url: Option<String>,
    },

    /// List the records in the metadata store.
    Status {
        /// Metadata store file.
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print a man page to stdout.
    Man,
}

/// Flags from `catfetch run` that override the config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOverrides {
    pub theme: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub catalog_url: Option<String>,
}

impl RunOverrides {
    pub fn apply(self, cfg: &mut FetchConfig) {
        if let Some(theme) = self.theme {
            cfg.theme = theme;
        }
        if let Some(dir) = self.data_dir {
            cfg.data_dir = dir;
        }
        if let Some(store) = self.store {
            cfg.store_path = store;
        }
        if let Some(jobs) = self.jobs {
            cfg.max_concurrent_downloads = jobs.max(1);
        }
        if let Some(url) = self.catalog_url {
            cfg.catalog_url = url;
        }
    }
}

impl CliCommand {
    /// Parse arguments, dispatch, and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Completions { shell } => {
                run_completions(shell);
                return Ok(EXIT_SUCCESS);
            }
            CliCommand::Man => {
                run_man()?;
                return Ok(EXIT_SUCCESS);
            }
            _ => {}
        }

        let mut cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                theme,
                data_dir,
                store,
                jobs,
                catalog_url,
            } => {
                RunOverrides {
                    theme,
                    data_dir,
                    store,
                    jobs,
                    catalog_url,
                }
                .apply(&mut cfg);
                run_fetch(&cfg).await
            }
            CliCommand::Status { store } => {
                let path = store.unwrap_or_else(|| cfg.store_path.clone());
                run_status(&path)?;
                Ok(EXIT_SUCCESS)
            }
            CliCommand::Completions { .. } | CliCommand::Man => Ok(EXIT_SUCCESS),
        }
    }
}

#[cfg(test)]
mod tests;

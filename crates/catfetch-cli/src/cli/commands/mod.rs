//! CLI command handlers, one per file.

mod completions;
mod run;
mod status;

pub use completions::{run_completions, run_man};
pub use run::run_fetch;
pub use status::run_status;

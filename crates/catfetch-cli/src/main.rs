use catfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
    }

    let code = match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("catfetch error: {:#}", err);
            cli::EXIT_FATAL
        }
    };
    std::process::exit(code);
}

pub mod catalog;
pub mod config;
pub mod decision;
pub mod executor;
pub mod logging;
pub mod normalize;
pub mod orchestrator;
pub mod probe;
pub mod remote;
pub mod retry;
pub mod storage;
pub mod store;
pub mod url_model;

pub use orchestrator::{Orchestrator, RunError, RunStatus, RunSummary};

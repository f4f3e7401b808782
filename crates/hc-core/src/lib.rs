//! Host collector core library.
//!
//! This library provides the command-level pieces of the `host-collector`
//! binary:
//! - Exit codes for CLI operations
//! - Host name resolution
//! - The `clean` / `clean-text` pipelines
//! - Logging setup
//!
//! The binary entry point is in `main.rs`.

pub mod clean;
pub mod exit_codes;
pub mod host;
pub mod logging;

pub use clean::{
    run_clean, run_clean_text, CleanError, CleanOutcome, CleanRequest, ConfigRequest, TextRequest,
};
pub use exit_codes::ExitCode;

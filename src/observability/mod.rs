//! Structured logging to a rotating file.
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → RotatingFileWriter → citydex.log
//! ```
//!
//! # Features
//!
//! - **File Output**: `citydex.log` in the data directory, never the terminal
//! - **Automatic Rotation**: Files rotate at 10MB with 3-backup retention
//! - **Spans**: engine commands, loads, store operations and worker messages
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Rotating file writer with size-based rotation

pub mod file_writer;
pub mod init;

pub use file_writer::RotatingFileWriter;
pub use init::{init_tracing, LOG_FILE_NAME};

//! Structured logging for cmdbot.
//!
//! Human-readable console output plus optional daily-rolling NDJSON files.

pub mod logger;

pub use logger::{LOG_FILE_NAME, init_logger};

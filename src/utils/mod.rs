//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod logging;

pub use logging::{init as init_logging, LogLevel};

//! Common module
//!
//! This module contains shared errors, logging setup, and file helpers used throughout the crate.

pub mod error;
pub mod fs;
pub mod log;

// Re-export commonly used types and functions
pub use self::error::{ConfigureError, ErrorKind, Result, TargetError};
pub use self::log::init_logger;

//! Global error handling for contentdump
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project. Per-file failures during a scan are not
//! represented here; they are reported through [`crate::inspector::Inspection`].

use std::io;
use thiserror::Error;

/// Global error type for contentdump operations
#[derive(Error, Debug)]
pub enum DumpError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML processing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV processing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page size outside the accepted range
    #[error("Invalid page size {0}: must be at least 1")]
    InvalidPageSize(usize),

    /// Output format not recognized by the exporter
    #[error("Unsupported output format: {0} (expected one of json, csv, xml, yaml)")]
    UnsupportedFormat(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Stored content could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// External metadata tool errors
    #[error("Metadata tool error: {0}")]
    MetadataTool(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for contentdump operations
pub type Result<T> = std::result::Result<T, DumpError>;

/// Creates a DumpError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::DumpError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            DumpError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

// Allow converting DumpError to io::Error for callers and tests that work in io::Result
impl From<DumpError> for io::Error {
    fn from(err: DumpError) -> Self {
        match err {
            DumpError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

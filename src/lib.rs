/*!
 * contentdump - Export directory contents as paginated JSON, CSV, XML or YAML
 *
 * This library walks a directory tree, collects per-file metadata and
 * (optionally gzip-compressed) text content, splits the records into pages
 * and serializes them in the requested format.
 */

pub mod config;
pub mod error;
pub mod filter;
pub mod inspector;
pub mod metadata;
pub mod paginate;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use config::{Args, Config, FileConfig};
pub use error::{DumpError, Result};
pub use filter::{
    is_excluded, validate_pattern, ExclusionFilter, DEFAULT_EXCLUDE_DIRS, DEFAULT_EXCLUDE_FILES,
};
pub use inspector::{decode_content, FileInspector, Inspection, SkipReason};
pub use metadata::MetadataTool;
pub use paginate::paginate;
pub use report::{ReportFormat, Reporter, ScanReport};
pub use scanner::{Scanner, ScannerStatistics};
pub use types::{FileRecord, Page, PaginatedFiles};
pub use utils::{count_files, format_file_size};
pub use writer::{export, Exporter, OutputFormat};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

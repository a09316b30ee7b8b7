/*!
 * Utility functions for contentdump
 */

use std::path::Path;

use walkdir::WalkDir;

use crate::config::Config;
use crate::filter::ExclusionFilter;

/// Count the files a scan would inspect, for progress tracking
///
/// Applies the same pruning and file exclusion as the scanner, so the count
/// is exact unless the tree changes or files turn out to be unreadable.
pub fn count_files(dir: &Path, config: &Config) -> u64 {
    let filter = ExclusionFilter::with_defaults(&config.exclude_patterns);

    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || !filter.is_dir_excluded(entry.path())
        })
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir() && entry.path().is_file())
        .filter(|entry| !filter.is_file_excluded(entry.path()))
        .count() as u64
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

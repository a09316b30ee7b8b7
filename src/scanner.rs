/*!
 * Directory walking and per-directory file inspection
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{DumpError, Result};
use crate::filter::ExclusionFilter;
use crate::inspector::{FileInspector, Inspection};
use crate::metadata::MetadataTool;
use crate::types::FileRecord;

/// Scanner statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerStatistics {
    /// Files that produced a record
    pub files_processed: usize,
    /// Files that were inspected but dropped
    pub files_skipped: usize,
    /// Directories visited, including the root
    pub directories_visited: usize,
    /// Sum of `size_bytes` over produced records
    pub total_bytes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    files_processed: AtomicUsize,
    files_skipped: AtomicUsize,
    directories_visited: AtomicUsize,
    total_bytes: AtomicU64,
}

/// Scanner for directory contents
pub struct Scanner {
    /// Scan root
    root: PathBuf,
    /// Effective exclusion sets
    filter: ExclusionFilter,
    /// Per-file inspector
    inspector: FileInspector,
    /// Worker pool, present in parallel mode
    pool: Option<ThreadPool>,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    counters: Counters,
}

impl Scanner {
    /// Create a new scanner
    ///
    /// The metadata tool is looked up once here; if it cannot be found a
    /// single warning is logged and extended metadata is disabled.
    pub fn new(config: &Config, progress: Arc<ProgressBar>) -> Result<Self> {
        let metadata_tool = config.metadata_tool.as_deref().and_then(|program| {
            let tool = MetadataTool::detect(program, config.metadata_timeout);
            if tool.is_none() {
                warn!(
                    tool = program,
                    "Metadata tool not found, extended metadata disabled"
                );
            }
            tool
        });

        let pool = if config.parallel {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .thread_name(|i| format!("contentdump-worker-{}", i))
                .build()
                .map_err(|e| DumpError::Config(format!("Failed to build worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        let filter = ExclusionFilter::with_defaults(&config.exclude_patterns);
        debug!(
            dir_patterns = filter.dir_patterns().len(),
            file_patterns = filter.file_patterns().len(),
            "Exclusion sets ready"
        );

        Ok(Self {
            root: config.target_dir.clone(),
            filter,
            inspector: FileInspector::new(config.compress, metadata_tool),
            pool,
            progress,
            counters: Counters::default(),
        })
    }

    /// Get scanner statistics
    pub fn get_statistics(&self) -> ScannerStatistics {
        ScannerStatistics {
            files_processed: self.counters.files_processed.load(Ordering::Relaxed),
            files_skipped: self.counters.files_skipped.load(Ordering::Relaxed),
            directories_visited: self.counters.directories_visited.load(Ordering::Relaxed),
            total_bytes: self.counters.total_bytes.load(Ordering::Relaxed),
        }
    }

    /// Walk the root and return one record per readable, non-excluded file
    ///
    /// In sequential mode the order is deterministic: within a directory,
    /// files sorted by name, then subdirectories sorted by name. Parallel mode
    /// yields the same records with directory-local order unspecified.
    pub fn scan(&self) -> Result<Vec<FileRecord>> {
        let root = fs::canonicalize(&self.root)?;
        if !root.is_dir() {
            return Err(DumpError::PathNotFound(format!(
                "'{}' is not a directory",
                self.root.display()
            )));
        }

        info!(
            root = %root.display(),
            parallel = self.pool.is_some(),
            "Scanning directory"
        );

        let mut records = Vec::new();
        self.scan_directory(&root, &root, &mut records);
        Ok(records)
    }

    /// Append records for `dir`, then recurse into its non-excluded subdirectories
    fn scan_directory(&self, root: &Path, dir: &Path, records: &mut Vec<FileRecord>) {
        self.counters.directories_visited.fetch_add(1, Ordering::Relaxed);

        let entries: Vec<DirEntry> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                    None
                }
            })
            .collect();

        // Symlinked directories are not followed; symlinked files are read through the link
        let (dirs, others): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|e| e.file_type().is_dir());

        let files: Vec<PathBuf> = others
            .into_iter()
            .map(DirEntry::into_path)
            .filter(|path| path.is_file())
            .filter(|path| {
                let excluded = self.filter.is_file_excluded(path);
                if excluded {
                    debug!(path = %path.display(), "Excluded file");
                }
                !excluded
            })
            .collect();

        match &self.pool {
            Some(pool) => {
                // join: every file of this directory finishes before the append
                let batch: Vec<FileRecord> = pool.install(|| {
                    files
                        .par_iter()
                        .filter_map(|path| self.process_file(root, path))
                        .collect()
                });
                records.extend(batch);
            }
            None => {
                records.extend(files.iter().filter_map(|path| self.process_file(root, path)));
            }
        }

        for entry in dirs {
            if self.filter.is_dir_excluded(entry.path()) {
                debug!(path = %entry.path().display(), "Pruned directory");
                continue;
            }
            self.scan_directory(root, entry.path(), records);
        }
    }

    /// Inspect one file, logging and counting anything that gets dropped
    fn process_file(&self, root: &Path, path: &Path) -> Option<FileRecord> {
        self.progress.inc(1);

        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        // Truncate if too long to avoid display issues
        let display_name = if file_name.chars().count() > 40 {
            let start = file_name
                .char_indices()
                .rev()
                .nth(36)
                .map(|(i, _)| i)
                .unwrap_or(0);
            format!("...{}", &file_name[start..])
        } else {
            file_name
        };
        self.progress.set_message(format!("Current file: {}", display_name));

        match self.inspector.inspect(root, path) {
            Inspection::Record(record) => {
                self.counters.files_processed.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .total_bytes
                    .fetch_add(record.size_bytes, Ordering::Relaxed);
                Some(record)
            }
            Inspection::Skipped(reason) => {
                self.counters.files_skipped.fetch_add(1, Ordering::Relaxed);
                warn!(path = %path.display(), reason = %reason, "Skipping file");
                None
            }
        }
    }
}

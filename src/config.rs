/*!
 * Configuration handling for contentdump
 *
 * Options are layered: built-in defaults, then command-line flags, then an
 * optional configuration file whose fields override the flags.
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use clap::Parser;
use clap_complete::Shell;
use serde::Deserialize;

use crate::error::{DumpError, Result, ResultExt};
use crate::filter::validate_pattern;
use crate::metadata::{DEFAULT_METADATA_TIMEOUT, DEFAULT_METADATA_TOOL};
use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::writer::OutputFormat;

/// Command-line arguments for contentdump
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "contentdump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scan a directory and export paginated file metadata and content",
    long_about = "Walks a directory tree, collects metadata and (optionally gzip-compressed) text content for every file that is not excluded, splits the result into pages and writes it as JSON, CSV, XML or YAML."
)]
pub struct Args {
    /// Directory to scan
    #[clap(required_unless_present = "generate")]
    pub directory: Option<String>,

    /// Store content as hex-encoded gzip instead of raw text
    #[clap(long)]
    pub compress: bool,

    /// Inspect the files of each directory on a worker pool
    #[clap(long)]
    pub parallel: bool,

    /// Number of files per page
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Additional name patterns to exclude (files and directories, glob syntax)
    #[clap(short, long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Output format: json, csv, xml or yaml
    #[clap(short = 'f', long, default_value = "json")]
    pub output_format: String,

    /// Output file base name, without extension
    #[clap(short, long, default_value = "output")]
    pub output_file: String,

    /// External program used to extract extended metadata
    #[clap(long, default_value = DEFAULT_METADATA_TOOL)]
    pub metadata_tool: String,

    /// Do not run the external metadata program
    #[clap(long)]
    pub no_metadata: bool,

    /// Seconds before a metadata program invocation is killed
    #[clap(long, value_name = "SECS", default_value_t = DEFAULT_METADATA_TIMEOUT.as_secs())]
    pub metadata_timeout: u64,

    /// Worker threads for --parallel (defaults to available CPUs)
    #[clap(long)]
    pub threads: Option<usize>,

    /// JSON or YAML file whose settings override the flags
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Hide the progress bar and summary table
    #[clap(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Normalized scan options consumed by the pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Root directory to scan
    pub target_dir: PathBuf,

    /// Store content gzip-compressed and hex-encoded
    pub compress: bool,

    /// Use the worker pool for file inspection
    pub parallel: bool,

    /// Records per page
    pub page_size: usize,

    /// User exclusion patterns, unioned with the defaults at scan time
    pub exclude_patterns: BTreeSet<String>,

    /// Requested output format, checked by [`Config::validate`]
    pub output_format: String,

    /// Output base name; the format's extension is appended
    pub output_file: String,

    /// External metadata program, `None` to disable
    pub metadata_tool: Option<String>,

    /// Upper bound for one metadata program run
    pub metadata_timeout: Duration,

    /// Worker threads for parallel mode
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("."),
            compress: false,
            parallel: false,
            page_size: DEFAULT_PAGE_SIZE,
            exclude_patterns: BTreeSet::new(),
            output_format: OutputFormat::Json.to_string(),
            output_file: "output".to_string(),
            metadata_tool: Some(DEFAULT_METADATA_TOOL.to_string()),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            num_threads: default_threads(),
        }
    }
}

impl Config {
    /// Default configuration rooted at `target_dir`
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ..Self::default()
        }
    }

    /// Create configuration from command-line arguments, applying the
    /// configuration file named by `--config` on top
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = Self {
            target_dir: PathBuf::from(args.directory.unwrap_or_else(|| ".".to_string())),
            compress: args.compress,
            parallel: args.parallel,
            page_size: args.page_size,
            exclude_patterns: args.exclude.into_iter().collect(),
            output_format: args.output_format,
            output_file: args.output_file,
            metadata_tool: (!args.no_metadata).then_some(args.metadata_tool),
            metadata_timeout: Duration::from_secs(args.metadata_timeout),
            num_threads: args.threads.unwrap_or_else(default_threads),
        };

        if let Some(path) = &args.config {
            FileConfig::load(path)?.apply(&mut config)?;
        }

        Ok(config)
    }

    /// Parsed output format
    pub fn format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.output_format)
            .map_err(|_| DumpError::UnsupportedFormat(self.output_format.clone()))
    }

    /// Path the export will be written to
    pub fn output_path(&self) -> Result<PathBuf> {
        Ok(self.format()?.output_path(Path::new(&self.output_file)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.target_dir.is_dir() {
            return Err(DumpError::PathNotFound(format!(
                "'{}' does not exist or is not a directory",
                self.target_dir.display()
            )));
        }

        if self.page_size == 0 {
            return Err(DumpError::InvalidPageSize(self.page_size));
        }

        self.format()?;

        crate::ensure!(
            !self.output_file.is_empty(),
            Config,
            "output file name must not be empty"
        );
        crate::ensure!(
            self.num_threads > 0,
            Config,
            "thread count must be at least 1"
        );

        for pattern in &self.exclude_patterns {
            validate_pattern(pattern)?;
        }

        Ok(())
    }
}

/// Settings read from a configuration file; every field is optional
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub compress: Option<bool>,
    pub parallel: Option<bool>,
    pub page_size: Option<i64>,
    pub exclude_patterns: Option<Vec<String>>,
    pub metadata_tool_path: Option<String>,
    pub output_format: Option<String>,
    pub output_file: Option<String>,
}

impl FileConfig {
    /// Read a configuration file; `.json` is parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(serde_yaml::from_str(&text)?)
        }
    }

    /// Override `config` with every field present in this file
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(compress) = self.compress {
            config.compress = compress;
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
        if let Some(page_size) = self.page_size {
            crate::ensure!(
                page_size > 0,
                Config,
                "page_size must be a positive integer, got {}",
                page_size
            );
            config.page_size = usize::try_from(page_size)
                .map_err(|_| DumpError::Config(format!("page_size {} is too large", page_size)))?;
        }
        if let Some(patterns) = self.exclude_patterns {
            config.exclude_patterns = patterns.into_iter().collect();
        }
        if let Some(tool) = self.metadata_tool_path {
            config.metadata_tool = (!tool.is_empty()).then_some(tool);
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(file) = self.output_file {
            config.output_file = file;
        }
        Ok(())
    }
}

fn default_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

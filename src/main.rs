/*!
 * Command-line interface for contentdump
 */

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use contentdump::config::{Args, Config};
use contentdump::error::{DumpError, Result};
use contentdump::paginate::paginate;
use contentdump::report::{ReportFormat, Reporter, ScanReport};
use contentdump::scanner::Scanner;
use contentdump::utils::count_files;
use contentdump::writer::{Exporter, OutputFormat};

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "contentdump", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    setup_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        // A missing scan root is reported but is not a failed run
        Err(e @ DumpError::PathNotFound(_)) => {
            eprintln!("Error: {}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;

    // Defaults, then flags, then the optional config file
    let config = Config::from_args(args)?;
    config.validate()?;
    let format = config.format()?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };

    progress.set_prefix("📊 Setup");
    progress.set_message(format!(
        "📂 Scanning directory: {}",
        config.target_dir.display()
    ));

    // Count files for progress tracking
    let total_files = count_files(&config.target_dir, &config);
    progress.set_length(total_files);
    progress.set_prefix("📊 Processing");

    let scanner = Scanner::new(&config, Arc::new(progress.clone()))?;

    // Start timing scan, pagination and export together
    let start_time = Instant::now();

    let records = scanner.scan()?;
    let paginated = paginate(records, config.page_size)?;
    let output_path = Exporter::new(format).export(&paginated, Path::new(&config.output_file))?;

    let total_duration = start_time.elapsed();
    progress.finish_and_clear();

    if quiet {
        println!("{}", output_path.display());
        return Ok(());
    }

    let stats = scanner.get_statistics();
    let files_exported = match format {
        OutputFormat::Csv => paginated.pages.first().map_or(0, |p| p.files.len()),
        _ => paginated.total_files(),
    };

    let scan_report = ScanReport {
        output_file: output_path.display().to_string(),
        format: format.to_string(),
        duration: total_duration,
        files_processed: stats.files_processed,
        files_skipped: stats.files_skipped,
        directories_visited: stats.directories_visited,
        pages: paginated.pages.len(),
        files_exported,
        total_bytes: stats.total_bytes,
        largest_files: ScanReport::largest_files(&paginated, 10),
    };

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    reporter.print_report(&scan_report);

    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "contentdump=debug,warn"
    } else if quiet {
        "warn"
    } else {
        "contentdump=info,warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

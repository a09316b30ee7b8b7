/*!
 * Reporting functionality for contentdump
 *
 * Renders a summary of a finished run using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::PaginatedFiles;
use crate::utils::format_file_size;

/// Size entry for one exported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReportInfo {
    /// Path relative to the scan root
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

/// Statistics for a finished run
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Output file path
    pub output_file: String,
    /// Output format name
    pub format: String,
    /// Time taken to scan and export
    pub duration: Duration,
    /// Files that produced a record
    pub files_processed: usize,
    /// Files dropped as unreadable or non-text
    pub files_skipped: usize,
    /// Directories visited
    pub directories_visited: usize,
    /// Number of pages produced
    pub pages: usize,
    /// Records written to the output (CSV holds the first page only)
    pub files_exported: usize,
    /// Sum of file sizes
    pub total_bytes: u64,
    /// Largest files, biggest first
    pub largest_files: Vec<FileReportInfo>,
}

impl ScanReport {
    /// The `limit` largest records of `data`, biggest first, ties by path
    pub fn largest_files(data: &PaginatedFiles, limit: usize) -> Vec<FileReportInfo> {
        let mut files: Vec<FileReportInfo> = data
            .files()
            .map(|f| FileReportInfo {
                path: f.relative_path.clone(),
                size: f.size_bytes,
            })
            .collect();
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        files.truncate(limit);
        files
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for scan results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string based on scan statistics
    pub fn generate_report(&self, report: &ScanReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &ScanReport) {
        println!("\n{}", self.generate_report(report));
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📂 Output File".to_string(),
                value: report.output_file.clone(),
            },
            SummaryRow {
                key: "🗂️ Format".to_string(),
                value: report.format.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📁 Directories".to_string(),
                value: self.format_number(report.directories_visited),
            },
            SummaryRow {
                key: "📄 Files Processed".to_string(),
                value: self.format_number(report.files_processed),
            },
        ];

        if report.files_skipped > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Files Skipped".to_string(),
                value: self.format_number(report.files_skipped),
            });
        }

        rows.push(SummaryRow {
            key: "📑 Pages".to_string(),
            value: self.format_number(report.pages),
        });

        if report.files_exported != report.files_processed {
            rows.push(SummaryRow {
                key: "📤 Files Exported".to_string(),
                value: format!(
                    "{} (first page only)",
                    self.format_number(report.files_exported)
                ),
            });
        }

        rows.push(SummaryRow {
            key: "📦 Total Size".to_string(),
            value: format_file_size(report.total_bytes),
        });

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Size")]
            size: String,
        }

        let rows: Vec<FileRow> = report
            .largest_files
            .iter()
            .map(|info| FileRow {
                path: truncate_path(&info.path, 60),
                size: format_file_size(info.size),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        let summary_table = self.create_summary_table(report);
        let summary_title = "✅  EXPORT COMPLETE";

        if report.largest_files.is_empty() {
            return format!("{}\n{}", summary_title, summary_table);
        }

        let files_table = self.create_files_table(report);
        let files_title = "📋  LARGEST FILES";

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, summary_title, summary_table
        )
    }
}

/// Keep the trailing path segments that fit in `max_len`
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let mut segments = Vec::new();
    let mut current_len = 3; // "..."
    for part in path.rsplit('/') {
        let part_len = part.chars().count() + 1;
        if current_len + part_len > max_len {
            break;
        }
        segments.push(part);
        current_len += part_len;
    }

    if segments.is_empty() {
        let tail: Vec<char> = path.chars().collect();
        let start = tail.len().saturating_sub(max_len.saturating_sub(3));
        return format!("...{}", tail[start..].iter().collect::<String>());
    }

    segments.reverse();
    format!(".../{}", segments.join("/"))
}

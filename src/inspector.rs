/*!
 * Per-file inspection: content, timestamps, MIME type and extended metadata
 */

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use once_cell::sync::Lazy;
use tracing::warn;

use crate::error::{DumpError, Result};
use crate::metadata::MetadataTool;
use crate::types::{ExtendedMetadata, FileRecord};

/// Why a file produced no record
#[derive(Debug)]
pub enum SkipReason {
    /// Open, stat or read failed
    Unreadable(io::Error),
    /// Content is not valid UTF-8 text
    NotUtf8,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "unreadable: {}", e),
            Self::NotUtf8 => write!(f, "content is not valid UTF-8 text"),
        }
    }
}

/// Outcome of inspecting a single file
#[derive(Debug)]
pub enum Inspection {
    Record(FileRecord),
    Skipped(SkipReason),
}

impl Inspection {
    /// The record, if the file was inspected successfully
    pub fn into_record(self) -> Option<FileRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }
}

/// Turns files into [`FileRecord`]s
#[derive(Debug, Clone, Default)]
pub struct FileInspector {
    compress: bool,
    metadata_tool: Option<MetadataTool>,
}

impl FileInspector {
    /// Create a new inspector
    pub fn new(compress: bool, metadata_tool: Option<MetadataTool>) -> Self {
        Self {
            compress,
            metadata_tool,
        }
    }

    /// Inspect `path`, recording its location relative to `root`
    ///
    /// Never fails: unreadable or non-text files come back as
    /// [`Inspection::Skipped`], and a failing metadata tool only empties the
    /// record's `metadata`.
    pub fn inspect(&self, root: &Path, path: &Path) -> Inspection {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return Inspection::Skipped(SkipReason::Unreadable(e)),
        };
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return Inspection::Skipped(SkipReason::NotUtf8),
        };
        let fs_metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => return Inspection::Skipped(SkipReason::Unreadable(e)),
        };

        let content = if self.compress {
            match compress_content(&text) {
                Ok(hex) => hex,
                Err(e) => return Inspection::Skipped(SkipReason::Unreadable(e)),
            }
        } else {
            text
        };

        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mime_type = guess_mime_type(path).map(str::to_string);

        let metadata = match (&self.metadata_tool, &mime_type) {
            (Some(tool), Some(_)) => tool.extract(path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Metadata extraction failed");
                ExtendedMetadata::new()
            }),
            _ => ExtendedMetadata::new(),
        };

        // ctime is not exposed everywhere; fall back to mtime
        let modified = fs_metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = fs_metadata.created().unwrap_or(modified);

        Inspection::Record(FileRecord {
            name,
            relative_path: relative_path(root, path),
            size_bytes: fs_metadata.len(),
            created_at: format_timestamp(created),
            modified_at: format_timestamp(modified),
            mime_type,
            metadata,
            content,
        })
    }
}

/// Gzip `text` and render the compressed bytes as lowercase hex
pub fn compress_content(text: &str) -> io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(hex::encode(compressed))
}

/// Reverse [`compress_content`]: hex-decode, gunzip, decode UTF-8
pub fn decode_content(content: &str) -> Result<String> {
    let compressed = hex::decode(content)
        .map_err(|e| DumpError::Decode(format!("content is not valid hex: {}", e)))?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

/// Format a filesystem timestamp as RFC 3339 in local time
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339()
}

/// `/`-separated path of `path` below `root`
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Extension to MIME type table
static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Text & markup
        ("txt", "text/plain"),
        ("text", "text/plain"),
        ("log", "text/plain"),
        ("md", "text/markdown"),
        ("markdown", "text/markdown"),
        ("rst", "text/x-rst"),
        ("csv", "text/csv"),
        ("tsv", "text/tab-separated-values"),
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("xml", "application/xml"),
        ("json", "application/json"),
        ("yaml", "application/yaml"),
        ("yml", "application/yaml"),
        ("toml", "application/toml"),
        ("ini", "text/plain"),
        ("svg", "image/svg+xml"),
        ("rtf", "application/rtf"),
        // Source code
        ("js", "text/javascript"),
        ("mjs", "text/javascript"),
        ("ts", "application/typescript"),
        ("py", "text/x-python"),
        ("rs", "text/rust"),
        ("c", "text/x-c"),
        ("h", "text/x-c"),
        ("cpp", "text/x-c++"),
        ("hpp", "text/x-c++"),
        ("java", "text/x-java"),
        ("go", "text/x-go"),
        ("rb", "text/x-ruby"),
        ("php", "application/x-httpd-php"),
        ("sh", "application/x-sh"),
        ("sql", "application/sql"),
        // Images
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("webp", "image/webp"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("ico", "image/vnd.microsoft.icon"),
        ("heic", "image/heic"),
        // Audio & video
        ("mp3", "audio/mpeg"),
        ("wav", "audio/wav"),
        ("flac", "audio/flac"),
        ("ogg", "audio/ogg"),
        ("m4a", "audio/mp4"),
        ("mp4", "video/mp4"),
        ("mov", "video/quicktime"),
        ("mkv", "video/x-matroska"),
        ("webm", "video/webm"),
        ("avi", "video/x-msvideo"),
        // Documents & archives
        ("pdf", "application/pdf"),
        ("doc", "application/msword"),
        ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        ("xls", "application/vnd.ms-excel"),
        ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        ("zip", "application/zip"),
        ("gz", "application/gzip"),
        ("tar", "application/x-tar"),
    ])
});

/// Best-effort MIME type from the file extension
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES.get(ext.as_str()).copied()
}

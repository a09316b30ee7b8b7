/*!
 * Core types and data structures for the contentdump application
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extended metadata reported by the external metadata tool
pub type ExtendedMetadata = BTreeMap<String, serde_json::Value>;

/// One processed file: filesystem metadata plus (possibly compressed) content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Base file name
    pub name: String,
    /// Path relative to the scan root, `/`-separated
    #[serde(rename = "path")]
    pub relative_path: String,
    /// Size in bytes at scan time
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Creation time, RFC 3339
    pub created_at: String,
    /// Last modification time, RFC 3339
    pub modified_at: String,
    /// MIME type guessed from the extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Extended metadata, empty when unavailable
    #[serde(default)]
    pub metadata: ExtendedMetadata,
    /// Raw text, or lowercase hex of the gzip-compressed text
    pub content: String,
}

/// A contiguous slice of the record list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    #[serde(rename = "page")]
    pub page_number: usize,
    /// Total number of pages in the result
    pub total_pages: usize,
    /// Records on this page, in scan order
    pub files: Vec<FileRecord>,
}

/// Full paginated scan result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedFiles {
    pub pages: Vec<Page>,
}

impl PaginatedFiles {
    /// Number of records across all pages
    pub fn total_files(&self) -> usize {
        self.pages.iter().map(|p| p.files.len()).sum()
    }

    /// Iterate every record in page order
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.pages.iter().flat_map(|p| p.files.iter())
    }
}

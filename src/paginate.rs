/*!
 * Fixed-size pagination of the scanned record list
 */

use crate::error::{DumpError, Result};
use crate::types::{FileRecord, Page, PaginatedFiles};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Split `records` into pages of `page_size`, preserving order
///
/// An empty input yields no pages. A zero page size is rejected.
pub fn paginate(records: Vec<FileRecord>, page_size: usize) -> Result<PaginatedFiles> {
    if page_size == 0 {
        return Err(DumpError::InvalidPageSize(page_size));
    }

    let total_pages = records.len().div_ceil(page_size);
    let mut pages = Vec::with_capacity(total_pages);
    let mut remaining = records.into_iter();

    for page_number in 1..=total_pages {
        let files: Vec<FileRecord> = remaining.by_ref().take(page_size).collect();
        pages.push(Page {
            page_number,
            total_pages,
            files,
        });
    }

    Ok(PaginatedFiles { pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            relative_path: name.to_string(),
            size_bytes: 0,
            created_at: String::new(),
            modified_at: String::new(),
            mime_type: None,
            metadata: Default::default(),
            content: String::new(),
        }
    }

    fn records(n: usize) -> Vec<FileRecord> {
        (0..n).map(|i| record(&format!("f{}", i))).collect()
    }

    #[test]
    fn test_page_counts() {
        for (n, size, expected) in [(0, 3, 0), (1, 3, 1), (3, 3, 1), (4, 3, 2), (7, 1, 7), (5, 100, 1)] {
            let paginated = paginate(records(n), size).unwrap();
            assert_eq!(paginated.pages.len(), expected, "n={} size={}", n, size);
            assert_eq!(paginated.total_files(), n);
        }
    }

    #[test]
    fn test_pages_preserve_order_and_metadata() {
        let paginated = paginate(records(5), 2).unwrap();

        let sizes: Vec<usize> = paginated.pages.iter().map(|p| p.files.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        for (i, page) in paginated.pages.iter().enumerate() {
            assert_eq!(page.page_number, i + 1);
            assert_eq!(page.total_pages, 3);
        }

        let names: Vec<&str> = paginated.files().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f0", "f1", "f2", "f3", "f4"]);
    }

    #[test]
    fn test_empty_input_has_no_pages() {
        let paginated = paginate(Vec::new(), 10).unwrap();
        assert!(paginated.pages.is_empty());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = paginate(records(3), 0).unwrap_err();
        assert!(matches!(err, DumpError::InvalidPageSize(0)));
    }
}

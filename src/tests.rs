/*!
 * End-to-end tests for scanning, pagination and export
 */

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;

use crate::config::Config;
use crate::inspector::decode_content;
use crate::paginate::paginate;
use crate::scanner::{Scanner, ScannerStatistics};
use crate::types::FileRecord;
use crate::writer::export;

fn test_config(dir: &Path) -> Config {
    Config {
        metadata_tool: None,
        num_threads: 4,
        ..Config::new(dir)
    }
}

fn scan(config: &Config) -> io::Result<(Vec<FileRecord>, ScannerStatistics)> {
    let scanner = Scanner::new(config, Arc::new(ProgressBar::hidden()))?;
    let records = scanner.scan()?;
    Ok((records, scanner.get_statistics()))
}

fn paths(records: &[FileRecord]) -> Vec<String> {
    records.iter().map(|r| r.relative_path.clone()).collect()
}

fn write_file(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content)
}

// Helper function to create a test directory structure
fn setup_test_directory() -> io::Result<tempfile::TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    write_file(&root.join("a.txt"), b"hello")?;
    write_file(&root.join("b.txt"), b"world")?;
    write_file(&root.join("binary.bin"), &[0xff, 0xfe, 0x00, 0x01])?;
    write_file(&root.join("dir1").join("c.md"), b"# nested\n")?;
    write_file(&root.join("dir1").join("sub").join("d.rs"), b"fn main() {}\n")?;

    // Excluded by default
    write_file(&root.join("node_modules").join("ignored.txt"), b"ignored")?;
    write_file(&root.join(".git").join("config"), b"[core]\n")?;
    write_file(&root.join("dir1").join("tmp").join("scratch.txt"), b"scratch")?;
    write_file(&root.join("package.json"), b"{}")?;
    write_file(&root.join("dir1").join(".env"), b"SECRET=1")?;

    Ok(temp_dir)
}

#[test]
fn test_basic_scan() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let (records, stats) = scan(&test_config(temp_dir.path()))?;

    assert_eq!(
        paths(&records),
        vec!["a.txt", "b.txt", "dir1/c.md", "dir1/sub/d.rs"]
    );
    assert_eq!(records[0].name, "a.txt");
    assert_eq!(records[0].content, "hello");
    assert_eq!(records[3].name, "d.rs");
    assert_eq!(records[3].size_bytes, 13);

    assert_eq!(stats.files_processed, 4);
    // binary.bin is inspected and dropped
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.total_bytes, 5 + 5 + 9 + 13);
    // root, dir1, dir1/sub
    assert_eq!(stats.directories_visited, 3);

    Ok(())
}

#[test]
fn test_excluded_directory_scenario() -> io::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    write_file(&temp_dir.path().join("a.txt"), b"hello")?;
    write_file(&temp_dir.path().join("b.txt"), b"world")?;
    write_file(
        &temp_dir.path().join("node_modules").join("ignored.txt"),
        b"ignored",
    )?;

    let config = Config {
        page_size: 1,
        ..test_config(temp_dir.path())
    };
    let (records, _) = scan(&config)?;
    let paginated = paginate(records, config.page_size)?;

    assert_eq!(paginated.pages.len(), 2);
    for page in &paginated.pages {
        assert_eq!(page.files.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    let contents: BTreeSet<&str> = paginated.files().map(|f| f.content.as_str()).collect();
    assert_eq!(contents, BTreeSet::from(["hello", "world"]));
    assert!(paginated.files().all(|f| f.name != "ignored.txt"));

    Ok(())
}

#[test]
fn test_user_patterns_prune_subtrees() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let config = Config {
        exclude_patterns: ["sub".to_string(), "*.md".to_string()].into_iter().collect(),
        ..test_config(temp_dir.path())
    };

    let (records, _) = scan(&config)?;
    assert_eq!(paths(&records), vec!["a.txt", "b.txt"]);

    Ok(())
}

#[test]
fn test_parallel_matches_sequential_membership() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    for i in 0..40 {
        write_file(
            &temp_dir.path().join("many").join(format!("file{:02}.txt", i)),
            format!("content {}", i).as_bytes(),
        )?;
    }

    let sequential = test_config(temp_dir.path());
    let parallel = Config {
        parallel: true,
        ..test_config(temp_dir.path())
    };

    let (seq_records, seq_stats) = scan(&sequential)?;
    let (par_records, par_stats) = scan(&parallel)?;

    assert_eq!(seq_records.len(), 44);
    assert_eq!(seq_stats, par_stats);

    let mut seq_paths = paths(&seq_records);
    let mut par_paths = paths(&par_records);
    seq_paths.sort();
    par_paths.sort();
    assert_eq!(seq_paths, par_paths);

    let unique: BTreeSet<&String> = par_paths.iter().collect();
    assert_eq!(unique.len(), par_paths.len());

    Ok(())
}

#[test]
fn test_compressed_content_round_trips() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let config = Config {
        compress: true,
        ..test_config(temp_dir.path())
    };

    let (compressed, _) = scan(&config)?;
    let (raw, _) = scan(&test_config(temp_dir.path()))?;

    assert_eq!(compressed.len(), raw.len());
    for (c, r) in compressed.iter().zip(raw.iter()) {
        assert_eq!(c.relative_path, r.relative_path);
        assert_ne!(c.content, r.content);
        assert_eq!(decode_content(&c.content)?, r.content);
    }

    Ok(())
}

#[test]
fn test_scan_is_idempotent() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let config = test_config(temp_dir.path());

    let (first, _) = scan(&config)?;
    let (second, _) = scan(&config)?;

    let key = |r: &FileRecord| {
        (
            r.name.clone(),
            r.relative_path.clone(),
            r.size_bytes,
            r.content.clone(),
        )
    };
    assert_eq!(
        first.iter().map(key).collect::<Vec<_>>(),
        second.iter().map(key).collect::<Vec<_>>()
    );
    assert_eq!(first, second);

    Ok(())
}

#[test]
fn test_modified_time_is_reported() -> io::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("dated.txt");
    write_file(&path, b"dated")?;

    // 2021-01-01T00:00:00Z
    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_609_459_200, 0))?;

    let (records, _) = scan(&test_config(temp_dir.path()))?;
    let modified = chrono::DateTime::parse_from_rfc3339(&records[0].modified_at)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    assert_eq!(modified.timestamp(), 1_609_459_200);

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinks() -> io::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    write_file(&root.join("real").join("target.txt"), b"linked")?;
    std::os::unix::fs::symlink(root.join("real").join("target.txt"), root.join("link.txt"))?;
    std::os::unix::fs::symlink(root.join("real"), root.join("loop"))?;

    let (records, _) = scan(&test_config(root))?;

    // the file link is read through; the directory link is not descended
    assert_eq!(paths(&records), vec!["link.txt", "real/target.txt"]);
    assert_eq!(records[0].content, "linked");

    Ok(())
}

#[test]
fn test_csv_covers_first_page_json_covers_all() -> io::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let tree = temp_dir.path().join("tree");
    for name in ["one.txt", "two.txt", "three.txt"] {
        write_file(&tree.join(name), name.as_bytes())?;
    }

    let config = Config {
        page_size: 1,
        ..test_config(&tree)
    };
    let (records, _) = scan(&config)?;
    let paginated = paginate(records, config.page_size)?;
    assert_eq!(paginated.pages.len(), 3);

    let base = temp_dir.path().join("output");
    let csv_path = export(&paginated, "csv", &base)?;
    let json_path = export(&paginated, "json", &base)?;

    let mut reader = csv::Reader::from_path(&csv_path)?;
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 1);
    // sorted by name: one, three, two
    assert_eq!(&rows[0][0], "one.txt");

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
    let names: Vec<&str> = json["pages"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|p| p["files"].as_array().into_iter().flatten())
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert_eq!(names, vec!["one.txt", "three.txt", "two.txt"]);

    Ok(())
}

#[test]
fn test_empty_directory_exports_no_pages() -> io::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let tree = temp_dir.path().join("empty");
    fs::create_dir(&tree)?;

    let (records, stats) = scan(&test_config(&tree))?;
    assert!(records.is_empty());
    assert_eq!(stats.directories_visited, 1);

    let paginated = paginate(records, 100)?;
    let path = export(&paginated, "json", &temp_dir.path().join("output"))?;
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    assert_eq!(json, serde_json::json!({ "pages": [] }));

    Ok(())
}

#[test]
fn test_scan_missing_root_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(&temp_dir.path().join("missing"));
    let scanner = Scanner::new(&config, Arc::new(ProgressBar::hidden())).unwrap();
    assert!(scanner.scan().is_err());
}

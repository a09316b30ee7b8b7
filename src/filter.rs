/*!
 * Exclusion rules for directory and file names
 *
 * Matching is always done on the basename, so a pattern such as `tmp`
 * prunes every directory called `tmp` regardless of depth.
 */

use std::collections::BTreeSet;
use std::path::Path;

use glob_match::glob_match;

use crate::error::Result;

/// Directory names that are never descended into
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    "build",
    ".git",
    ".svn",
    "dist",
    "__pycache__",
    ".pytest_cache",
    "venv",
    ".vscode",
    "vendor",
    ".idea",
    "bin",
    "obj",
    ".DS_Store",
    "tmp",
];

/// File names that are never inspected
pub const DEFAULT_EXCLUDE_FILES: &[&str] = &[
    ".DS_Store",
    ".env",
    ".env.local",
    ".env.docker",
    ".env.docker.testing",
    ".gitignore",
    ".gitkeep",
    ".gitattributes",
    ".gitmodules",
    "package-lock.json",
    "package.json",
    "vendor",
    "composer.lock",
    "requirements.txt",
    "yarn.lock",
    "yarn-error.log",
    "composer-lock.json",
    "yarn-debug.log",
    "access_log",
    "error_log",
];

/// Returns true if `name` equals or glob-matches any pattern
pub fn is_excluded<'a, I>(name: &str, patterns: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    patterns
        .into_iter()
        .any(|pattern| pattern == name || glob_match(pattern, name))
}

/// Check that every `[` and `{` in `pattern` is closed
///
/// glob-match treats an unclosed group leniently, so `{a` would match `a`.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    let mut braces = 0usize;
    let mut in_class = false;
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            _ if in_class => {
                if c == ']' {
                    in_class = false;
                }
            }
            '[' => in_class = true,
            '{' => braces += 1,
            '}' => {
                crate::ensure!(
                    braces > 0,
                    Config,
                    "Invalid exclude pattern '{}': unmatched '}}'",
                    pattern
                );
                braces -= 1;
            }
            _ => {}
        }
    }

    crate::ensure!(
        !in_class,
        Config,
        "Invalid exclude pattern '{}': unclosed '['",
        pattern
    );
    crate::ensure!(
        braces == 0,
        Config,
        "Invalid exclude pattern '{}': unclosed '{{'",
        pattern
    );
    Ok(())
}

/// Effective exclusion sets for one run
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    dirs: BTreeSet<String>,
    files: BTreeSet<String>,
}

impl ExclusionFilter {
    /// Build a filter from explicit base sets, unioned with user patterns
    pub fn new<'a>(
        base_dirs: &[&str],
        base_files: &[&str],
        user_patterns: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let mut dirs: BTreeSet<String> = base_dirs.iter().map(|s| s.to_string()).collect();
        let mut files: BTreeSet<String> = base_files.iter().map(|s| s.to_string()).collect();

        for pattern in user_patterns {
            dirs.insert(pattern.clone());
            files.insert(pattern.clone());
        }

        Self { dirs, files }
    }

    /// The default sets plus the given user patterns
    pub fn with_defaults<'a>(user_patterns: impl IntoIterator<Item = &'a String>) -> Self {
        Self::new(DEFAULT_EXCLUDE_DIRS, DEFAULT_EXCLUDE_FILES, user_patterns)
    }

    /// Should this directory (and its whole subtree) be pruned
    pub fn is_dir_excluded(&self, path: &Path) -> bool {
        is_excluded(&basename(path), &self.dirs)
    }

    /// Should this file be skipped
    pub fn is_file_excluded(&self, path: &Path) -> bool {
        is_excluded(&basename(path), &self.files)
    }

    /// Patterns applied to directory names
    pub fn dir_patterns(&self) -> &BTreeSet<String> {
        &self.dirs
    }

    /// Patterns applied to file names
    pub fn file_patterns(&self) -> &BTreeSet<String> {
        &self.files
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> BTreeSet<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_and_glob_match() {
        let patterns = set(&["tmp", "*.log"]);
        assert!(is_excluded("tmp", &patterns));
        assert!(is_excluded("server.log", &patterns));
        assert!(!is_excluded("tmpfile", &patterns));
        assert!(!is_excluded("log.txt", &patterns));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let patterns: BTreeSet<String> = BTreeSet::new();
        assert!(!is_excluded("anything", &patterns));
        assert!(!is_excluded("", &patterns));
    }

    #[test]
    fn test_defaults_are_separate_per_kind() {
        let filter = ExclusionFilter::with_defaults(&Vec::<String>::new());

        assert!(filter.is_dir_excluded(Path::new("/a/b/node_modules")));
        assert!(!filter.is_file_excluded(Path::new("/a/b/node_modules")));

        assert!(filter.is_file_excluded(Path::new("project/package.json")));
        assert!(!filter.is_dir_excluded(Path::new("project/package.json")));

        // vendor and .DS_Store sit in both default sets
        assert!(filter.is_dir_excluded(Path::new("vendor")));
        assert!(filter.is_file_excluded(Path::new("vendor")));
    }

    #[test]
    fn test_user_patterns_apply_to_both_kinds() {
        let user = vec!["secret*".to_string()];
        let filter = ExclusionFilter::with_defaults(&user);

        assert!(filter.is_dir_excluded(Path::new("root/secrets")));
        assert!(filter.is_file_excluded(Path::new("root/secret.txt")));
        assert!(!filter.is_file_excluded(Path::new("root/public.txt")));
    }

    #[test]
    fn test_validate_pattern() {
        for good in ["tmp", "*.log", "*.{js,ts}", "file[0-9].txt", "[{]x", "a\\{b"] {
            assert!(validate_pattern(good).is_ok(), "{}", good);
        }
        for bad in ["{a", "a}", "file[0-9", "*.{js,ts"] {
            let err = validate_pattern(bad).unwrap_err();
            assert!(matches!(err, crate::error::DumpError::Config(_)), "{}", bad);
            assert!(err.to_string().contains(bad));
        }
    }

    #[test]
    fn test_basename_only() {
        let filter = ExclusionFilter::new(&["tmp"], &[], &Vec::<String>::new());
        assert!(filter.is_dir_excluded(Path::new("deep/nested/tmp")));
        assert!(!filter.is_dir_excluded(Path::new("tmp/nested")));
    }
}

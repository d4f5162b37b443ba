//! Utility functions for common operations.
//!
//! This module provides shared utilities used across the crate:
//! - Atomic file operations for data safety
//! - Compact size and percentage formatting for display

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ExplorerError, Result};

/// Atomically write content to a file.
///
/// This function ensures data integrity by:
/// 1. Writing to a temporary file in the same directory
/// 2. Flushing the data
/// 3. Atomically renaming the temp file to the target path
///
/// If any step fails, the original file (if it exists) remains unchanged.
///
/// # Example
///
/// ```rust,no_run
/// use taxonomy_explorer::util::atomic_write;
///
/// atomic_write("config.toml", b"key = \"value\"").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    let parent = path.parent().ok_or_else(|| ExplorerError::IoError {
        context: format!("Cannot determine parent directory for: {}", path.display()),
        source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
    })?;

    if !parent.as_os_str().is_empty() && !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ExplorerError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the rename on one filesystem.
    let temp_dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let mut temp_file = NamedTempFile::new_in(temp_dir).map_err(|e| {
        ExplorerError::io(
            format!("Failed to create temporary file in: {}", temp_dir.display()),
            e,
        )
    })?;

    temp_file.write_all(content).map_err(|e| {
        ExplorerError::io(
            format!("Failed to write to temporary file for: {}", path.display()),
            e,
        )
    })?;

    temp_file.flush().map_err(|e| {
        ExplorerError::io(
            format!("Failed to flush temporary file for: {}", path.display()),
            e,
        )
    })?;

    temp_file.persist(path).map_err(|e| {
        ExplorerError::io(
            format!("Failed to atomically write file: {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

/// Format a descendant count compactly: `950`, `1.2k`, `84.0k`.
///
/// ```
/// use taxonomy_explorer::util::format_size;
///
/// assert_eq!(format_size(1200), "1.2k");
/// assert_eq!(format_size(999), "999");
/// ```
pub fn format_size(size: u64) -> String {
    if size >= 1000 {
        format!("{:.1}k", size as f64 / 1000.0)
    } else {
        size.to_string()
    }
}

/// Format an optional size, showing `?` when unknown.
pub fn format_optional_size(size: Option<u64>) -> String {
    size.map_or_else(|| "?".to_string(), format_size)
}

/// Format an integer with thousands separators: `84214` → `84,214`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Share of the root's size taken by a node, as a percentage in `0..=100`.
///
/// Returns 0 when the root size is zero.
pub fn percent_of_root(size: u64, root_size: u64) -> f64 {
    if root_size == 0 {
        return 0.0;
    }
    (size as f64 * 100.0 / root_size as f64).min(100.0)
}

/// Percentage label with two decimals; tiny shares render as `<0.01`.
pub fn format_percent(percent: f64) -> String {
    if percent < 0.01 {
        "<0.01".to_string()
    } else {
        format!("{percent:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        atomic_write(&path, b"Hello, world!").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("test.txt");

        atomic_write(&path, b"Nested content").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "old").unwrap();

        atomic_write(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(999), "999");
        assert_eq!(format_size(1000), "1.0k");
        assert_eq!(format_size(1200), "1.2k");
        assert_eq!(format_size(84_214), "84.2k");
        assert_eq!(format_optional_size(None), "?");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(84_214), "84,214");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_percent_of_root() {
        assert!((percent_of_root(25, 100) - 25.0).abs() < f64::EPSILON);
        assert!(percent_of_root(5, 0).abs() < f64::EPSILON);
        assert_eq!(format_percent(percent_of_root(1, 100_000)), "<0.01");
        assert_eq!(format_percent(12.346), "12.35");
    }
}

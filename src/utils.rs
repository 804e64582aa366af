//! Small helpers for logging and output paths.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) and
/// suffixed with `"…(+N bytes)"`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Make sure the directory that will hold `file` exists and is writable.
///
/// Creates missing parent directories, then writes and removes a scratch file.
///
/// # Arguments
///
/// * `file` - Path of the file that will be written later
///
/// # Returns
///
/// `Ok(())` if the parent directory accepts writes, or the I/O error otherwise.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_parent_writable(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).await?;

    let scratch = dir.join("..__scratch_write__");
    fs::write(&scratch, b"").await?;
    let _ = fs::remove_file(&scratch).await;
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "éééé";
        assert_eq!(truncate_for_log(s, 3), "é…(+6 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_parent_writable_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("report.json");
        ensure_parent_writable(&file).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert!(!dir.path().join("nested").join("..__scratch_write__").exists());
    }
}

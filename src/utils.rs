use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Lowercased text after the last `.` of a URL, the way the source site keys
/// its assets. A URL with no dot returns the whole (lowercased) string.
pub fn url_extension(url: &str) -> String {
    url.rsplit('.').next().unwrap_or(url).to_lowercase()
}

/// Trailing path segment of a URL, query string stripped.
pub fn url_filename(url: &str) -> String {
    let tail = url.rsplit('/').next().unwrap_or(url);
    tail.split('?').next().unwrap_or(tail).to_string()
}

pub fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|err| format!("Failed to create temp file in {parent:?}: {err}"))?;
    temp.write_all(bytes)
        .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    temp.flush()
        .map_err(|err| format!("Failed to flush {}: {err}", path.display()))?;
    temp.persist(path)
        .map_err(|err| format!("Failed to persist {}: {err}", path.display()))?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<Option<PathBuf>, String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create directory {parent:?}: {err}"))?;
            return Ok(Some(parent.to_path_buf()));
        }
    }
    Ok(None)
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    std::fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create directory {path:?}: {err}"))
}

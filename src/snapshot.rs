use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::record::PaperRecord;
use crate::utils;

/// The persisted catalog. Each crawl tick fully replaces the file; the front
/// end reads it back on demand. A missing file means "no data yet".
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the snapshot with the full record list, pretty-printed.
    /// The write goes through a temp file and rename so a reader never sees
    /// a half-written catalog.
    pub fn save(&self, records: &[PaperRecord]) -> Result<(), String> {
        let _ = utils::ensure_parent_dir(&self.path)?;
        let contents = serde_json::to_string_pretty(records)
            .map_err(|err| format!("Failed to serialize snapshot: {err}"))?;
        utils::write_atomic_bytes(&self.path, contents.as_bytes())
    }

    /// Missing file is a valid empty catalog; a file that exists but does
    /// not parse is an error the caller has to see.
    pub fn load(&self) -> Result<Vec<PaperRecord>, String> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|err| format!("Failed to read snapshot {}: {err}", self.path.display()))?;
        serde_json::from_str(&contents)
            .map_err(|err| format!("Failed to parse snapshot {}: {err}", self.path.display()))
    }

    pub fn last_written(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|meta| meta.modified()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            authors: "Ada Lovelace, Alan Turing".to_string(),
            gitlab: "42 code implementations".to_string(),
            date: "12 Mar 2024".to_string(),
            cover_img: "https://host/cover.png".to_string(),
            abstract_text: "Full abstract text.".to_string(),
            strip_abstract: "Full abstract".to_string(),
            arxiv_url: "https://arxiv.org/pdf/2403.00001.pdf".to_string(),
            entity_stars: "512".to_string(),
            stars_accumulated: "3 stars / hour".to_string(),
            paper_task: vec!["Image Classification".to_string()],
            code: vec!["https://github.com/example/repo".to_string()],
        }
    }

    #[test]
    fn load_on_missing_path_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("paper_database.json"));
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("paper_database.json"));
        let records = vec![sample_record("first"), sample_record("second")];
        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn save_fully_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("paper_database.json"));
        store.save(&[sample_record("old")]).unwrap();
        store.save(&[sample_record("new")]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "new");
    }

    #[test]
    fn corrupt_snapshot_surfaces_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper_database.json");
        fs::write(&path, "{not json").unwrap();
        let store = SnapshotStore::new(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn snapshot_uses_original_field_names() {
        let json = serde_json::to_string(&sample_record("x")).unwrap();
        assert!(json.contains("\"gitlab\""));
        assert!(json.contains("\"abstract\""));
        assert!(json.contains("\"strip_abstract\""));
    }
}

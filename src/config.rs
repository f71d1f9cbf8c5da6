use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_BASE_URL: &str = "https://paperswithcode.com";
const DEFAULT_SNAPSHOT_PATH: &str = "paper_database.json";
const DEFAULT_IMG_DIR: &str = "static/papers/img";
const DEFAULT_PDF_DIR: &str = "static/papers/pdf";
const DEFAULT_PAGE_COUNT: u32 = 5;
const DEFAULT_INTERVAL_SECS: u64 = 3600;
// Header the source site accepts without throttling plain-client requests.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub snapshot_path: String,
    pub img_dir: String,
    pub pdf_dir: String,
    pub page_count: u32,
    pub interval_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            img_dir: DEFAULT_IMG_DIR.to_string(),
            pdf_dir: DEFAULT_PDF_DIR.to_string(),
            page_count: DEFAULT_PAGE_COUNT,
            interval_secs: DEFAULT_INTERVAL_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CrawlConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default)]
    pub img_dir: Option<String>,
    #[serde(default)]
    pub pdf_dir: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl CrawlConfig {
    fn from_file(file: CrawlConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            snapshot_path: file.snapshot_path.unwrap_or(defaults.snapshot_path),
            img_dir: file.img_dir.unwrap_or(defaults.img_dir),
            pdf_dir: file.pdf_dir.unwrap_or(defaults.pdf_dir),
            page_count: file.page_count.unwrap_or(defaults.page_count),
            interval_secs: file.interval_secs.unwrap_or(defaults.interval_secs),
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

pub fn load_config(path: &Path) -> Result<CrawlConfig, String> {
    if path.exists() {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read config {path:?}: {err}"))?;
        let file = serde_json::from_str::<CrawlConfigFile>(&contents)
            .map_err(|err| format!("Failed to parse config {path:?}: {err}"))?;
        Ok(CrawlConfig::from_file(file))
    } else {
        Ok(CrawlConfig::default())
    }
}

pub fn write_config(path: &Path, config: &CrawlConfig) -> Result<(), String> {
    let _ = crate::utils::ensure_parent_dir(path)?;
    let contents = serde_json::to_string_pretty(config)
        .map_err(|err| format!("Failed to serialize config {path:?}: {err}"))?;
    fs::write(path, contents).map_err(|err| format!("Failed to write config {path:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_config(Path::new("does-not-exist.json")).unwrap();
        assert_eq!(config.page_count, DEFAULT_PAGE_COUNT);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn partial_config_file_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"page_count": 2, "base_url": "http://localhost:9000"}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.page_count, 2);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.interval_secs, DEFAULT_INTERVAL_SECS);
    }
}

use reqwest::blocking::Client;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::utils;

const CHUNK_SIZE: usize = 512;
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "png", "bmp", "gif"];

/// Where an asset lands on disk, decided by its URL extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Pdf,
}

pub fn classify_extension(extension: &str) -> Option<AssetKind> {
    if IMAGE_EXTENSIONS.contains(&extension) {
        Some(AssetKind::Image)
    } else if extension == "pdf" {
        Some(AssetKind::Pdf)
    } else {
        None
    }
}

/// Result of one asset fetch. Skipped and Unsupported involve no network
/// access at all; Failed leaves any partial file in place and is never
/// retried.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Downloaded(u64),
    Skipped,
    Unsupported(String),
    Failed(String),
}

pub struct AssetStore {
    img_dir: PathBuf,
    pdf_dir: PathBuf,
    client: Client,
}

impl AssetStore {
    pub fn new(img_dir: impl Into<PathBuf>, pdf_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let img_dir = img_dir.into();
        let pdf_dir = pdf_dir.into();
        utils::ensure_dir(&img_dir)?;
        utils::ensure_dir(&pdf_dir)?;
        let client = Client::builder()
            .build()
            .map_err(|err| format!("Failed to build HTTP client: {err}"))?;
        Ok(Self {
            img_dir,
            pdf_dir,
            client,
        })
    }

    /// Target path for a URL, or None when the extension maps to neither
    /// asset directory. An explicit name becomes `<name>.<extension>`,
    /// otherwise the URL's trailing segment is used verbatim.
    pub fn target_path(&self, url: &str, name: Option<&str>) -> Option<PathBuf> {
        let extension = utils::url_extension(url);
        let kind = classify_extension(&extension)?;
        let filename = match name {
            Some(name) => format!("{name}.{extension}"),
            None => utils::url_filename(url),
        };
        let dir = match kind {
            AssetKind::Image => &self.img_dir,
            AssetKind::Pdf => &self.pdf_dir,
        };
        Some(dir.join(filename))
    }

    pub fn fetch(&self, url: &str, name: Option<&str>) -> FetchOutcome {
        let path = match self.target_path(url, name) {
            Some(path) => path,
            None => return FetchOutcome::Unsupported(utils::url_extension(url)),
        };
        if path.exists() {
            return FetchOutcome::Skipped;
        }
        match self.stream_to_disk(url, &path) {
            Ok(bytes) => FetchOutcome::Downloaded(bytes),
            Err(err) => FetchOutcome::Failed(err),
        }
    }

    fn stream_to_disk(&self, url: &str, path: &Path) -> Result<u64, String> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| format!("Failed to fetch {url}: {err}"))?;
        if !response.status().is_success() {
            return Err(format!("Failed to fetch {url}: HTTP {}", response.status()));
        }
        let total = response.content_length().filter(|len| *len > 0);

        let mut file = File::create(path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| format!("Failed while reading {url}: {err}"))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
            downloaded += read as u64;
            print_progress(&filename, downloaded, total);
        }
        println!();
        println!(
            "Download {filename} completed. ({:.2}MB)",
            downloaded as f64 / (1024.0 * 1024.0)
        );
        Ok(downloaded)
    }
}

/// Percentage progress when the server advertised a size, raw byte counts
/// when it did not.
fn print_progress(filename: &str, downloaded: u64, total: Option<u64>) {
    let downloaded_mb = downloaded as f64 / (1024.0 * 1024.0);
    match total {
        Some(total) => {
            let total_mb = total as f64 / (1024.0 * 1024.0);
            let percent = downloaded * 100 / total;
            print!("\r[{percent:>3}%] {downloaded_mb:.2}MB / {total_mb:.2}MB {filename}");
        }
        None => {
            print!("\r{downloaded_mb:.2}MB {filename}");
        }
    }
    let _ = io::stdout().flush();
}

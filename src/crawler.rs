use reqwest::blocking::Client;
use scraper::Html;

use crate::config::CrawlConfig;
use crate::download::{AssetStore, FetchOutcome};
use crate::extract;
use crate::record::PaperRecord;
use crate::snapshot::SnapshotStore;

/// Sequential scrape of the catalog site: listing pages in order, one detail
/// page per card, two asset downloads per paper, no concurrency anywhere.
pub struct Crawler {
    client: Client,
    assets: AssetStore,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| format!("Failed to build HTTP client: {err}"))?;
        let assets = AssetStore::new(&config.img_dir, &config.pdf_dir)?;
        Ok(Self {
            client,
            assets,
            config,
        })
    }

    fn get_document(&self, url: &str) -> Result<Html, String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| format!("Failed to fetch {url}: {err}"))?;
        if !response.status().is_success() {
            return Err(format!("Failed to fetch {url}: HTTP {}", response.status()));
        }
        let body = response
            .text()
            .map_err(|err| format!("Failed to read {url}: {err}"))?;
        Ok(Html::parse_document(&body))
    }

    fn fetch_asset(&self, url: &str, name: &str) {
        match self.assets.fetch(url, Some(name)) {
            FetchOutcome::Downloaded(_) | FetchOutcome::Skipped => {}
            FetchOutcome::Unsupported(extension) => {
                eprintln!("unsupported asset extension \"{extension}\" for {url}");
            }
            FetchOutcome::Failed(err) => {
                eprintln!("error downloading {url}");
                eprintln!("{err}");
            }
        }
    }

    /// Walks listing pages `1..page_count` (a page_count of N fetches N-1
    /// pages, matching the site mirror this replaces) and assembles one
    /// record per card. Extraction errors abort the whole crawl; asset
    /// download failures are logged and skipped.
    pub fn crawl(&self) -> Result<Vec<PaperRecord>, String> {
        let mut papers = Vec::new();
        for page in 1..self.config.page_count {
            let listing_url = format!("{}/?page={page}", self.config.base_url);
            println!("fetching listing {listing_url}");
            let listing = self.get_document(&listing_url)?;
            let cards = extract::extract_cards(&listing)?;
            drop(listing);

            for card in cards {
                let detail_url = format!("{}{}", self.config.base_url, card.detail_path);
                let detail_page = self.get_document(&detail_url)?;
                let detail = extract::extract_detail(&detail_page)?;
                drop(detail_page);

                self.fetch_asset(&detail.arxiv_url, &detail.title);
                if card.cover_img.is_empty() {
                    eprintln!("no cover image for {}", detail.title);
                } else {
                    self.fetch_asset(&card.cover_img, &detail.title);
                }

                papers.push(PaperRecord {
                    title: detail.title,
                    authors: detail.authors,
                    gitlab: card.gitlab,
                    date: detail.date,
                    cover_img: card.cover_img,
                    abstract_text: detail.abstract_text,
                    strip_abstract: card.strip_abstract,
                    arxiv_url: detail.arxiv_url,
                    entity_stars: card.entity_stars,
                    stars_accumulated: card.stars_accumulated,
                    paper_task: detail.paper_task,
                    code: detail.code,
                });
            }
        }
        Ok(papers)
    }

    /// One full tick: crawl everything, then replace the snapshot. An
    /// aborted crawl leaves the previous snapshot untouched.
    pub fn tick(&self, store: &SnapshotStore) -> Result<usize, String> {
        let papers = self.crawl()?;
        store.save(&papers)?;
        Ok(papers.len())
    }
}

//! Fetch + extract over a list of URLs.
//!
//! URLs are processed concurrently with a bounded pool and reassembled in
//! input order. A failing URL is logged and skipped; the batch as a whole
//! never fails, and a batch where every URL fails yields an empty corpus.

use crate::config::{ExtractionThresholds, Settings};
use crate::error::{ConfigError, FetchError};
use crate::models::{ArticleCorpus, ExtractedText};
use crate::scrapers::extract::{extract_batch, extract_single};
use crate::scrapers::fetcher::ArticleFetcher;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ArticleScraper {
    fetcher: ArticleFetcher,
    thresholds: ExtractionThresholds,
    max_concurrent: usize,
}

impl ArticleScraper {
    pub fn new(fetcher: ArticleFetcher, thresholds: ExtractionThresholds, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            thresholds,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self::new(
            ArticleFetcher::from_settings(settings)?,
            settings.extraction,
            settings.max_concurrent_fetches,
        ))
    }

    /// Fetch one article and return its trimmed body text.
    ///
    /// Unlike the batch path, a fetch failure is returned to the caller.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_article(&self, url: &str) -> Result<String, FetchError> {
        let html = self.fetcher.fetch(url).await?;
        let content = extract_single(&html, &self.thresholds);
        info!(chars = content.body.chars().count(), "Scraped article");
        Ok(content.body)
    }

    /// Scrape every URL, keeping successes in input order.
    #[instrument(level = "info", skip_all, fields(url_count = urls.len()))]
    pub async fn scrape_all(&self, urls: &[String]) -> ArticleCorpus {
        let t0 = Instant::now();
        let results: Vec<Option<ExtractedText>> = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| async move {
                match self.fetcher.fetch(url).await {
                    Ok(html) => {
                        let content = extract_batch(&html, &self.thresholds);
                        debug!(index, %url, chars = content.body.chars().count(), "Extracted article");
                        Some(ExtractedText {
                            source_url: url.clone(),
                            title: content.title,
                            body: content.body,
                        })
                    }
                    Err(e) => {
                        warn!(index, %url, error = %e, "Skipping URL - failed to fetch");
                        None
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let corpus = ArticleCorpus::from(results.into_iter().flatten().collect::<Vec<_>>());
        info!(
            requested = urls.len(),
            scraped = corpus.articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Batch scrape complete"
        );
        corpus
    }

    /// Scrape every URL and render the survivors as one corpus string.
    pub async fn scrape_corpus(&self, urls: &[String]) -> String {
        self.scrape_all(urls).await.render()
    }
}

//! Summarization engine: corpus in, analysis out.
//!
//! ```text
//! AwaitingCorpus ──(too short)──────────────► Default (insufficient data)
//!        │
//!        └──(enough text)──► AwaitingModel ──(decoded)──► Validated
//!                                   │
//!                                   └──(error)──────────► Default (analysis failed)
//! ```
//!
//! Every path returns a complete [`StockAnalysis`].

use crate::api::{AskAsync, ChatMessage, ResponseFormat};
use crate::error::ModelError;
use crate::models::{NO_VALID_CONTENT, PersonaAnswer, StockAnalysis};
use crate::persona::{self, PersonaSession};
use crate::scrapers::ArticleScraper;
use crate::utils::{strip_code_fences, truncate_for_log};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

pub const STOCK_ANALYSIS_SCHEMA_NAME: &str = "stock_analysis";

pub struct Summarizer<A> {
    model: A,
    scraper: ArticleScraper,
    min_corpus_chars: usize,
}

impl<A: AskAsync> Summarizer<A> {
    pub fn new(model: A, scraper: ArticleScraper, min_corpus_chars: usize) -> Self {
        Self {
            model,
            scraper,
            min_corpus_chars,
        }
    }

    pub fn model(&self) -> &A {
        &self.model
    }

    /// Scrape `urls` and analyze the resulting corpus for `label`.
    #[instrument(level = "info", skip(self, urls), fields(url_count = urls.len()))]
    pub async fn summarize_structured(&self, label: &str, urls: &[String]) -> StockAnalysis {
        let corpus = self.scraper.scrape_corpus(urls).await;
        self.analyze_corpus(label, &corpus).await
    }

    /// Analyze an already scraped corpus.
    pub async fn analyze_corpus(&self, label: &str, corpus: &str) -> StockAnalysis {
        if !self.has_enough_content(corpus) {
            info!(label, chars = corpus.trim().chars().count(), "Corpus too short; skipping model");
            return StockAnalysis::insufficient_data(label);
        }

        let t0 = Instant::now();
        match self.request_analysis(label, corpus).await {
            Ok(analysis) => {
                let analysis = analysis.normalized(label);
                info!(
                    label,
                    key_events = analysis.key_events.len(),
                    suggestion = %analysis.suggestion.suggestion,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Structured analysis complete"
                );
                analysis
            }
            Err(e) => {
                error!(label, error = %e, "Structured analysis failed");
                StockAnalysis::analysis_failed(label, &e)
            }
        }
    }

    async fn request_analysis(&self, label: &str, corpus: &str) -> Result<StockAnalysis, ModelError> {
        let format = ResponseFormat::json_schema::<StockAnalysis>(STOCK_ANALYSIS_SCHEMA_NAME);
        let messages = [ChatMessage::user(structured_prompt(label, corpus))];
        let reply = self.model.ask(&messages, Some(&format)).await?;

        serde_json::from_str::<StockAnalysis>(strip_code_fences(&reply)).map_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Model returned non-conforming JSON"
            );
            ModelError::from_decode(e)
        })
    }

    /// Scrape `urls` and return a free-text summary for `label`.
    #[instrument(level = "info", skip(self, urls), fields(url_count = urls.len()))]
    pub async fn summarize_plain(&self, label: &str, urls: &[String]) -> String {
        let corpus = self.scraper.scrape_corpus(urls).await;
        if !self.has_enough_content(&corpus) {
            info!(label, "Corpus too short; skipping model");
            return NO_VALID_CONTENT.to_string();
        }

        let messages = [ChatMessage::user(plain_prompt(label, &corpus))];
        match self.model.ask(&messages, None).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                error!(label, error = %e, "Plain summarization failed");
                format!("Error occurred during summarization: {e}")
            }
        }
    }

    /// Persona Q&A within `session`.
    pub async fn ask_persona(&self, session: &mut PersonaSession, question: &str) -> PersonaAnswer {
        persona::ask_persona(&self.model, session, question).await
    }

    fn has_enough_content(&self, corpus: &str) -> bool {
        corpus.trim().chars().count() >= self.min_corpus_chars
    }
}

pub fn structured_prompt(label: &str, corpus: &str) -> String {
    format!(
        "You are a financial analyst specializing in the stock market. \
         Analyze the following news articles related to the stock **{label}**. \
         Return a structured response with:\n\
         - A **concise summary** of the articles\n\
         - A list of **key events**: these must be descriptive and include details such as timelines, entities involved, and consequences\n\
         - A detailed **market impact** assessment: not just a label (positive/negative/mixed/neutral), but also explain *why* this impact is expected\n\
         - An **investment suggestion** as a JSON object with:\n  \
         - `suggestion`: one of [Strong Buy, Weak Buy, Hold, Weak Sell, Strong Sell]\n  \
         - `reason`: justification for this suggestion based on the article content\n\n\
         Article content:\n{corpus}"
    )
}

pub fn plain_prompt(label: &str, corpus: &str) -> String {
    format!(
        "You are a financial analyst specializing in the stock market. \
         Analyze the following news articles related to the stock **{label}**. \
         Provide a concise summary highlighting how {label} is impacted, including any relevant trends, events, or market sentiment.\n\n\
         {corpus}"
    )
}

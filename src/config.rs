//! Runtime settings loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file or a partial file is valid.
//! Credentials are not part of this file; they come from the command line or
//! the environment (`NEWS_API_KEY`, `GROQ_API_KEY`).
//!
//! ```yaml
//! model: meta-llama/llama-4-scout-17b-16e-instruct
//! model_timeout_secs: 60
//! max_concurrent_fetches: 6
//! extraction:
//!   early_exit_chars: 10000
//!   batch_fallback_chars: 1000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Groq serves an OpenAI-compatible chat completions API under this base.
pub const DEFAULT_LLM_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_NEWS_API_BASE: &str = "https://newsapi.org/v2";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Character thresholds used by the content extractor.
///
/// The single-article and batch paths deliberately use different fallback
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionThresholds {
    /// Stop scanning candidates once the best one is longer than this.
    pub early_exit_chars: usize,
    /// Below this, `scrape_article` falls back to every `<p>` on the page.
    pub single_article_fallback_chars: usize,
    /// Below this, batch scraping falls back to every `<p>` on the page.
    pub batch_fallback_chars: usize,
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            early_exit_chars: 10_000,
            single_article_fallback_chars: 10_000,
            batch_fallback_chars: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the OpenAI-compatible chat completions API.
    pub llm_api_base: String,
    pub model: String,
    pub model_timeout_secs: u64,
    /// Sampling temperature; omitted from requests when unset.
    pub temperature: Option<f32>,
    pub news_api_base: String,
    pub news_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_fetches: usize,
    /// Corpora shorter than this (after trimming) are not sent to the model.
    pub min_corpus_chars: usize,
    pub extraction: ExtractionThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_api_base: DEFAULT_LLM_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_timeout_secs: 60,
            temperature: None,
            news_api_base: DEFAULT_NEWS_API_BASE.to_string(),
            news_timeout_secs: 15,
            fetch_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent_fetches: 6,
            min_corpus_chars: 100,
            extraction: ExtractionThresholds::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or return the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(path, model = %settings.model, "Loaded configuration");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn news_timeout(&self) -> Duration {
        Duration::from_secs(self.news_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

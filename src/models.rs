//! Data models for news articles, scraped text, and LLM analyses.
//!
//! This module defines the data structures passed between pipeline stages:
//! - [`ArticleRecord`]: A deduplicated search hit from the news API
//! - [`ExtractedText`] / [`ArticleCorpus`]: Scraped article text, in fetch order
//! - [`StockAnalysis`]: The structured analysis returned by the model
//! - [`PersonaAnswer`]: The persona Q&A reply
//!
//! [`StockAnalysis`] is always complete. When the pipeline cannot produce a real
//! analysis it builds one through [`StockAnalysis::insufficient_data`] or
//! [`StockAnalysis::analysis_failed`], and the reason ends up in the summary
//! and suggestion fields.

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NO_DESCRIPTION: &str = "No Description";
pub const UNKNOWN_SOURCE: &str = "Unknown";
pub const NO_VALID_CONTENT: &str = "No valid content found in the provided URLs.";

/// A news search hit, as handed to the presentation layer.
///
/// Keys are serialized in the shape of the news API (`publishedAt`,
/// `urlToImage`) so existing consumers keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "urlToImage", skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    pub source: String,
}

/// Text scraped from one successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// The URL the page was fetched from.
    pub source_url: String,
    /// Content of the page's `<title>`, or the untitled placeholder.
    pub title: String,
    /// Best-effort article body. Empty when nothing usable was found.
    pub body: String,
}

/// Scraped articles in the order their URLs were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleCorpus {
    pub articles: Vec<ExtractedText>,
}

impl ArticleCorpus {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Render as `"{title} - {body}"` entries separated by a blank line.
    pub fn render(&self) -> String {
        self.articles
            .iter()
            .map(|a| format!("{} - {}", a.title, a.body))
            .join("\n\n")
    }
}

impl From<Vec<ExtractedText>> for ArticleCorpus {
    fn from(articles: Vec<ExtractedText>) -> Self {
        Self { articles }
    }
}

/// Recommendation level, from most bearish to most bullish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum Suggestion {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    #[serde(rename = "Weak Sell")]
    WeakSell,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Weak Buy")]
    WeakBuy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Suggestion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suggestion::StrongSell => "Strong Sell",
            Suggestion::WeakSell => "Weak Sell",
            Suggestion::Hold => "Hold",
            Suggestion::WeakBuy => "Weak Buy",
            Suggestion::StrongBuy => "Strong Buy",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSuggestion(pub String);

impl fmt::Display for UnknownSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown suggestion {:?}, expected one of Strong Sell, Weak Sell, Hold, Weak Buy, Strong Buy",
            self.0
        )
    }
}

impl std::error::Error for UnknownSuggestion {}

impl FromStr for Suggestion {
    type Err = UnknownSuggestion;

    /// Accepts the canonical labels and their case, space, underscore and
    /// hyphen variants ("strong_buy", "STRONG BUY", "StrongBuy").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "strongsell" => Ok(Suggestion::StrongSell),
            "weaksell" => Ok(Suggestion::WeakSell),
            "hold" => Ok(Suggestion::Hold),
            "weakbuy" => Ok(Suggestion::WeakBuy),
            "strongbuy" => Ok(Suggestion::StrongBuy),
            _ => Err(UnknownSuggestion(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Suggestion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Investment recommendation with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InvestmentSuggestion {
    /// One of: Strong Buy, Weak Buy, Hold, Weak Sell, Strong Sell
    pub suggestion: Suggestion,
    /// Explanation justifying the recommendation
    pub reason: String,
}

/// A notable event reported in the articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeyEvent {
    /// A short headline describing the event
    pub title: String,
    /// The date of the event in a human-readable format
    pub date: String,
    /// A detailed explanation of what happened
    pub description: String,
    /// Key entities involved in the event
    pub entities_involved: Vec<String>,
    /// What impact this event has on the stock or on market sentiment
    pub implications: String,
}

/// Structured analysis of the news around one stock or topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StockAnalysis {
    /// Overwritten with the caller's label after decoding.
    #[serde(default)]
    pub stock_symbol: String,
    /// A brief summary of the news articles
    pub summary: String,
    pub key_events: Vec<KeyEvent>,
    /// A brief one or two liner on the main market impact of the news
    pub market_impact: String,
    pub suggestion: InvestmentSuggestion,
}

impl StockAnalysis {
    /// The analysis returned when scraping produced too little text to analyze.
    pub fn insufficient_data(label: &str) -> Self {
        Self::neutral(
            label,
            NO_VALID_CONTENT.to_string(),
            "Neutral impact due to lack of sufficient information.",
            "Not enough data to support a confident decision.",
        )
    }

    /// The analysis returned when the model call or its decoding failed.
    pub fn analysis_failed(label: &str, error: &dyn std::error::Error) -> Self {
        Self::neutral(
            label,
            format!("Error occurred during analysis: {error}"),
            "Neutral due to failure in processing.",
            "Analysis failed due to internal error.",
        )
    }

    fn neutral(label: &str, summary: String, market_impact: &str, reason: &str) -> Self {
        Self {
            stock_symbol: label.to_string(),
            summary,
            key_events: Vec::new(),
            market_impact: market_impact.to_string(),
            suggestion: InvestmentSuggestion {
                suggestion: Suggestion::Hold,
                reason: reason.to_string(),
            },
        }
    }

    /// Pin the symbol to `label` and drop repeated entities within each key event.
    ///
    /// Key events keep the model's order, including events sharing a title.
    pub fn normalized(mut self, label: &str) -> Self {
        self.stock_symbol = label.to_string();
        for event in &mut self.key_events {
            event.entities_involved = std::mem::take(&mut event.entities_involved)
                .into_iter()
                .unique()
                .collect();
        }
        self
    }
}

/// Reply of the persona Q&A mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaAnswer {
    pub answer: String,
    pub youtube_links: Vec<String>,
}

impl PersonaAnswer {
    pub const FALLBACK_ANSWER: &'static str = "Sorry, couldn't parse the response.";

    pub fn fallback() -> Self {
        Self {
            answer: Self::FALLBACK_ANSWER.to_string(),
            youtube_links: Vec::new(),
        }
    }
}

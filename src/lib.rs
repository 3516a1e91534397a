//! # Market News Digest
//!
//! Financial news aggregation and summarization: find relevant articles
//! through NewsAPI, scrape their readable text, and turn the combined text
//! into a structured stock analysis with an OpenAI-compatible chat model.
//!
//! ## Pipeline
//!
//! 1. **Retrieval**: [`NewsRetriever`] queries NewsAPI and dedupes by title
//! 2. **Scraping**: [`ArticleScraper`] fetches and extracts article bodies
//! 3. **Analysis**: [`Summarizer`] asks the model for a schema-constrained
//!    [`StockAnalysis`], falling back to a default analysis on any failure
//! 4. **Output**: [`outputs`] renders JSON and Markdown

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod news;
pub mod outputs;
pub mod persona;
pub mod schema;
pub mod scrapers;
pub mod summarizer;
pub mod utils;

pub use api::{AskAsync, ChatClient};
pub use config::Settings;
pub use models::{ArticleRecord, PersonaAnswer, StockAnalysis};
pub use news::NewsRetriever;
pub use persona::PersonaSession;
pub use scrapers::ArticleScraper;
pub use summarizer::Summarizer;

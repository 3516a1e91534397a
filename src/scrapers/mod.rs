//! Article scraping: fetching pages and extracting their main text.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetcher`] | One HTTP GET per URL, browser User-Agent, fixed timeout |
//! | [`extract`] | Scored-candidate main-content extraction over a parsed DOM |
//! | [`batch`] | Concurrent fetch + extract over a URL list, input order preserved |
//!
//! # Failure Handling
//!
//! - `scrape_article` returns the fetch error to its caller
//! - batch scraping logs failed URLs and skips them
//! - extraction itself never fails; short text is passed on as-is

pub mod batch;
pub mod extract;
pub mod fetcher;

pub use batch::ArticleScraper;
pub use fetcher::ArticleFetcher;

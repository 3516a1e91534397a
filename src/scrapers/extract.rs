//! Main-content extraction from arbitrary article HTML.
//!
//! Every `article`, `main` and `div` element is a candidate. A candidate's
//! text is the text of all `<p>` elements below it, joined by spaces. The
//! longest candidate wins; once one exceeds the early-exit threshold the scan
//! stops. If the winner is still below the caller's fallback threshold, every
//! `<p>` in the document is used instead.
//!
//! Parsing is lenient and never fails. Short or empty output is not an error.

use crate::config::ExtractionThresholds;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

pub const UNTITLED_ARTICLE: &str = "Untitled Article";

static CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, main, div").expect("candidate selector"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("paragraph selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));

/// Title and body of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub body: String,
}

/// Extract title and body from `html`.
///
/// `fallback_chars` is call-site specific: the single-article path and the
/// batch path use different values (see [`ExtractionThresholds`]).
pub fn extract(html: &str, early_exit_chars: usize, fallback_chars: usize) -> PageContent {
    let document = Html::parse_document(html);
    let title = page_title(&document);

    let (mut body, _) = best_candidate(&document, early_exit_chars);
    if body.trim().chars().count() < fallback_chars {
        body = join_paragraphs(document.select(&PARAGRAPHS));
    }

    PageContent {
        title,
        body: body.trim().to_string(),
    }
}

/// Extraction as used by `scrape_article`.
pub fn extract_single(html: &str, thresholds: &ExtractionThresholds) -> PageContent {
    extract(
        html,
        thresholds.early_exit_chars,
        thresholds.single_article_fallback_chars,
    )
}

/// Extraction as used by batch scraping.
pub fn extract_batch(html: &str, thresholds: &ExtractionThresholds) -> PageContent {
    extract(html, thresholds.early_exit_chars, thresholds.batch_fallback_chars)
}

/// Scan candidates in document order and return the longest text with its
/// length in characters. Ties keep the earlier candidate.
pub fn best_candidate(document: &Html, early_exit_chars: usize) -> (String, usize) {
    let mut best = String::new();
    let mut best_len = 0;

    for candidate in document.select(&CANDIDATES) {
        let text = join_paragraphs(candidate.select(&PARAGRAPHS));
        let len = text.chars().count();
        if len > best_len {
            best = text;
            best_len = len;
        }
        if best_len > early_exit_chars {
            break;
        }
    }

    (best, best_len)
}

/// First `<title>` in the document, or [`UNTITLED_ARTICLE`].
pub fn page_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_ARTICLE.to_string())
}

fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> String {
    paragraphs.map(paragraph_text).join(" ")
}

/// Text of one paragraph: its trimmed, non-empty text nodes concatenated.
fn paragraph_text(p: ElementRef<'_>) -> String {
    p.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

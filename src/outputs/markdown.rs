//! Markdown rendering of analyses and news lists.

use crate::models::{ArticleRecord, StockAnalysis};
use std::fmt::Write;

pub fn analysis_to_markdown(analysis: &StockAnalysis) -> String {
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# {}\n", analysis.stock_symbol);
    let _ = writeln!(md, "## Summary\n\n{}\n", analysis.summary);
    let _ = writeln!(md, "## Market Impact\n\n{}\n", analysis.market_impact);
    let _ = writeln!(
        md,
        "## Suggestion: {}\n\n{}\n",
        analysis.suggestion.suggestion, analysis.suggestion.reason
    );

    if !analysis.key_events.is_empty() {
        let _ = writeln!(md, "## Key Events\n");
        for event in &analysis.key_events {
            let _ = writeln!(md, "### {} ({})\n", event.title, event.date);
            let _ = writeln!(md, "{}\n", event.description);
            if !event.entities_involved.is_empty() {
                let _ = writeln!(md, "*Entities:* {}\n", event.entities_involved.join(", "));
            }
            let _ = writeln!(md, "*Implications:* {}\n", event.implications);
        }
    }

    md
}

pub fn articles_to_markdown(heading: &str, articles: &[ArticleRecord]) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# {heading}\n");
    if articles.is_empty() {
        let _ = writeln!(md, "No results.");
        return md;
    }
    for article in articles {
        let _ = writeln!(md, "- [{}]({}) ({})", article.title, article.url, article.source);
        if !article.published_at.is_empty() {
            let _ = writeln!(md, "  - Published: {}", article.published_at);
        }
        let _ = writeln!(md, "  - {}", article.description);
    }
    md
}

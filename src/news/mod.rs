//! News search and headline deduplication.
//!
//! Wraps the NewsAPI `/v2/everything` endpoint. Both entry points search in
//! English sorted by relevancy and collapse headlines sharing a 20-character
//! prefix. Errors never escape: they are logged and become an empty list.

mod wire;

use crate::config::Settings;
use crate::error::{ConfigError, NewsError};
use crate::models::ArticleRecord;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Characters of the title used as the dedup key.
pub const TITLE_KEY_CHARS: usize = 20;
/// `query` never returns more than this many articles.
pub const MAX_TOPIC_ARTICLES: usize = 5;
pub const DEFAULT_TOPIC_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TODAY_PAGE_SIZE: u32 = 8;

/// Term appended to every topic search.
const TOPIC_SUFFIX: &str = "Stocks";
const TODAYS_MARKET_QUERY: &str =
    "Indian Stock Market OR Sensex OR Bombay Stock Exchange OR BSE OR NSE OR Indian Investments";
/// NewsAPI rejects page sizes above this.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct NewsRetriever {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsRetriever {
    /// Build a retriever. An empty API key is a configuration error.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("NEWS_API_KEY"));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(api_key: impl Into<String>, settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(api_key, settings.news_api_base.clone(), settings.news_timeout())
    }

    /// Most relevant unique articles about `topic`, at most five.
    #[instrument(level = "info", skip(self))]
    pub async fn query(&self, topic: &str, page_size: u32) -> Vec<ArticleRecord> {
        let q = format!("{} {}", topic.trim(), TOPIC_SUFFIX);
        match self.search(&q, page_size).await {
            Ok(records) => {
                let mut unique = dedupe_by_title_prefix(records);
                unique.truncate(MAX_TOPIC_ARTICLES);
                info!(count = unique.len(), "Fetched topic news");
                unique
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch news");
                Vec::new()
            }
        }
    }

    /// Unique articles for the fixed Indian market query, at most `page_size`.
    #[instrument(level = "info", skip(self))]
    pub async fn todays_market_news(&self, page_size: u32) -> Vec<ArticleRecord> {
        match self.search(TODAYS_MARKET_QUERY, page_size).await {
            Ok(records) => {
                let mut unique = dedupe_by_title_prefix(records);
                unique.truncate(page_size as usize);
                info!(count = unique.len(), "Fetched today's market news");
                unique
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch today's news");
                Vec::new()
            }
        }
    }

    async fn search(&self, q: &str, page_size: u32) -> Result<Vec<ArticleRecord>, NewsError> {
        let url = format!("{}/everything", self.base_url);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();

        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", q),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<wire::EverythingResponse>(&body);

        if !status.is_success() {
            return Err(match parsed {
                Ok(wire::EverythingResponse {
                    code: Some(code),
                    message,
                    ..
                }) => NewsError::Api {
                    code,
                    message: message.unwrap_or_default(),
                },
                _ => NewsError::Status(status.as_u16()),
            });
        }

        let envelope = parsed?;
        if envelope.status.as_deref() == Some("error") {
            return Err(NewsError::Api {
                code: envelope.code.unwrap_or_else(|| "unknown".to_string()),
                message: envelope.message.unwrap_or_default(),
            });
        }

        Ok(envelope.articles.into_iter().map(ArticleRecord::from).collect())
    }
}

/// Dedup key: the first 20 characters of the trimmed title, lowercased.
pub fn title_key(title: &str) -> String {
    title
        .trim()
        .chars()
        .take(TITLE_KEY_CHARS)
        .collect::<String>()
        .to_lowercase()
}

/// Keep the first article for each title key, skipping untitled ones.
///
/// Distinct headlines that share a 20-character prefix collide; the later one
/// is dropped.
pub fn dedupe_by_title_prefix(articles: impl IntoIterator<Item = ArticleRecord>) -> Vec<ArticleRecord> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| !a.title.trim().is_empty() && seen.insert(title_key(&a.title)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn record(title: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            description: "d".to_string(),
            url: format!("https://news.example/{}", title.len()),
            published_at: String::new(),
            image_url: None,
            source: "Example".to_string(),
        }
    }

    fn articles_json(titles: &[&str]) -> serde_json::Value {
        let articles: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                json!({
                    "source": {"id": null, "name": "Mint"},
                    "title": t,
                    "description": "desc",
                    "url": format!("https://mint.example/{i}"),
                    "urlToImage": null,
                    "publishedAt": "2025-06-05T09:00:00Z"
                })
            })
            .collect();
        json!({"status": "ok", "totalResults": titles.len(), "articles": articles})
    }

    fn retriever(server: &MockServer) -> NewsRetriever {
        NewsRetriever::new("news-key", server.url("/v2"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_title_key_prefix_collision() {
        assert_eq!(title_key("RBI Cuts Repo Rate Again"), "rbi cuts repo rate a");
        assert_eq!(
            title_key("RBI Cuts Repo Rate Again"),
            title_key("rbi cuts repo rate AGAIN, markets cheer")
        );
        // Differs at the 20th character.
        assert_ne!(
            title_key("RBI Cuts Repo Rate Again"),
            title_key("RBI Cuts Repo Rate Today")
        );
        let unique = dedupe_by_title_prefix(vec![
            record("RBI Cuts Repo Rate Again"),
            record("rbi cuts repo rate AGAIN, markets cheer"),
            record("RBI Cuts Repo Rate Today"),
        ]);
        let titles: Vec<_> = unique.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["RBI Cuts Repo Rate Again", "RBI Cuts Repo Rate Today"]);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence_order() {
        let unique = dedupe_by_title_prefix(vec![
            record("Sensex jumps 500 points on banks"),
            record("Nifty hits record high as IT rallies"),
            record("  SENSEX JUMPS 500 POINTS on weak data"),
            record(""),
            record("   "),
            record("Rupee slips"),
        ]);
        let titles: Vec<_> = unique.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Sensex jumps 500 points on banks",
                "Nifty hits record high as IT rallies",
                "Rupee slips"
            ]
        );
    }

    #[test]
    fn test_dedupe_never_yields_colliding_keys() {
        let titles = [
            "Adani Green Energy shares rise",
            "Adani Green Energy shares fall",
            "adani green energy s",
            "Tata Motors",
            "TATA MOTORS Q4",
            "Infosys",
        ];
        let unique = dedupe_by_title_prefix(titles.iter().map(|t| record(t)));
        let keys: HashSet<_> = unique.iter().map(|a| title_key(&a.title)).collect();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn test_title_key_counts_characters() {
        let title = "₹".repeat(25);
        assert_eq!(title_key(&title).chars().count(), TITLE_KEY_CHARS);
    }

    #[test]
    fn test_missing_credential() {
        let err = NewsRetriever::new("", "https://newsapi.org/v2", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("NEWS_API_KEY")));
    }

    #[tokio::test]
    async fn test_query_appends_suffix_and_caps_at_five() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/everything")
                    .header("x-api-key", "news-key")
                    .query_param("q", "TCS Stocks")
                    .query_param("language", "en")
                    .query_param("sortBy", "relevancy")
                    .query_param("pageSize", "50");
                then.status(200).json_body(articles_json(&[
                    "TCS wins large deal in Europe",
                    "TCS shares climb after results",
                    "TCS headcount drops again",
                    "TCS dividend record date set",
                    "TCS to hire 40,000 freshers",
                    "TCS board approves buyback",
                    "TCS buyback opens on Monday",
                ]));
            })
            .await;

        let news = retriever(&server).query("TCS", 50).await;
        mock.assert_async().await;
        assert_eq!(news.len(), MAX_TOPIC_ARTICLES);
        assert_eq!(news[0].title, "TCS wins large deal in Europe");
        assert_eq!(news[0].source, "Mint");
        assert_eq!(news[0].image_url, None);
    }

    #[tokio::test]
    async fn test_todays_news_is_bounded_by_page_size() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/everything")
                    .query_param("q", TODAYS_MARKET_QUERY)
                    .query_param("pageSize", "3");
                // The API is trusted to honour pageSize, but is not relied on.
                then.status(200).json_body(articles_json(&[
                    "Sensex ends flat amid global cues",
                    "Nifty IT index gains 2%",
                    "BSE smallcap hits record",
                    "NSE to extend trading hours",
                    "FPIs turn net buyers",
                ]));
            })
            .await;

        let news = retriever(&server).todays_market_news(3).await;
        mock.assert_async().await;
        assert_eq!(news.len(), 3);
    }

    #[tokio::test]
    async fn test_todays_news_not_capped_at_five() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/everything");
                then.status(200).json_body(articles_json(&[
                    "One headline about markets",
                    "Two headline about markets",
                    "Three headline about markets",
                    "Four headline about markets",
                    "Five headline about markets",
                    "Six headline about markets",
                    "Seven headline about markets",
                ]));
            })
            .await;

        let news = retriever(&server).todays_market_news(DEFAULT_TODAY_PAGE_SIZE).await;
        assert_eq!(news.len(), 7);
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/everything");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "articles": [
                        {"title": "  Bare article  "},
                        {"description": "no title, dropped"}
                    ]
                }));
            })
            .await;

        let news = retriever(&server).query("Infosys", 10).await;
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].title, "Bare article");
        assert_eq!(news[0].description, "No Description");
        assert_eq!(news[0].url, "");
        assert_eq!(news[0].published_at, "");
        assert_eq!(news[0].source, "Unknown");
    }

    #[tokio::test]
    async fn test_api_error_becomes_empty_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/everything");
                then.status(401).json_body(json!({
                    "status": "error",
                    "code": "apiKeyInvalid",
                    "message": "Your API key is invalid or incorrect."
                }));
            })
            .await;

        let r = retriever(&server);
        assert!(r.query("TCS", 10).await.is_empty());
        assert!(r.todays_market_news(8).await.is_empty());

        let err = r.search("TCS Stocks", 10).await.unwrap_err();
        assert!(matches!(err, NewsError::Api { ref code, .. } if code == "apiKeyInvalid"));
    }

    #[tokio::test]
    async fn test_garbage_body_becomes_empty_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/everything");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        assert!(retriever(&server).query("TCS", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_api_becomes_empty_list() {
        let r = NewsRetriever::new("news-key", "http://127.0.0.1:9/v2", Duration::from_secs(5)).unwrap();
        assert!(r.todays_market_news(8).await.is_empty());
    }

    #[tokio::test]
    async fn test_slow_api_times_out_per_settings() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/everything");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(articles_json(&["Late headline"]));
            })
            .await;

        let settings = Settings {
            news_api_base: server.url("/v2"),
            news_timeout_secs: 1,
            ..Settings::default()
        };
        let r = NewsRetriever::from_settings("news-key", &settings).unwrap();
        assert!(r.query("TCS", 10).await.is_empty());
    }
}

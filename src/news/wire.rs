use serde::Deserialize;

use crate::models::{ArticleRecord, NO_DESCRIPTION, UNKNOWN_SOURCE};

/// Body of `/v2/everything`, both success and error shapes.
#[derive(Debug, Deserialize)]
pub(crate) struct EverythingResponse {
    pub(crate) status: Option<String>,
    pub(crate) code: Option<String>,
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) articles: Vec<RawArticle>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawArticle {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) url: Option<String>,
    #[serde(rename = "publishedAt")]
    pub(crate) published_at: Option<String>,
    #[serde(rename = "urlToImage")]
    pub(crate) url_to_image: Option<String>,
    pub(crate) source: Option<RawSource>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSource {
    pub(crate) name: Option<String>,
}

impl From<RawArticle> for ArticleRecord {
    fn from(raw: RawArticle) -> Self {
        ArticleRecord {
            title: raw.title.unwrap_or_default().trim().to_string(),
            description: raw.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            url: raw.url.unwrap_or_default(),
            published_at: raw.published_at.unwrap_or_default(),
            image_url: raw.url_to_image.filter(|u| !u.is_empty()),
            source: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        }
    }
}

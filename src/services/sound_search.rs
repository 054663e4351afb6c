//! Remote sound catalogue search (Freesound), preview clips only

use std::{collections::HashMap, time::Duration};

use reqwest::{header::AUTHORIZATION, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const FREESOUND_SEARCH_URL: &str = "https://freesound.org/apiv2/search/";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("sound search is unavailable: no API token configured")]
    Unavailable,

    #[error("type a search term first")]
    EmptyQuery,

    #[error("sound search rejected the API token")]
    Unauthorized,

    #[error("search failed (HTTP {0})")]
    HttpStatus(u16),

    #[error("sound search network failure: {0}")]
    NetworkFailure(String),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundHit {
    pub name: String,
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<RawSound>,
}

#[derive(Debug, Deserialize)]
struct RawSound {
    name: Option<String>,
    #[serde(default)]
    previews: HashMap<String, String>,
}

impl From<RawSound> for SoundHit {
    fn from(raw: RawSound) -> Self {
        let preview_url = raw
            .previews
            .get("preview-hq-mp3")
            .or_else(|| raw.previews.get("preview-lq-mp3"))
            .cloned();
        Self {
            name: raw
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            preview_url,
        }
    }
}

/// Client for the Freesound text search
#[derive(Debug, Clone)]
pub struct SoundSearch {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl SoundSearch {
    pub fn new(token: Option<String>) -> Self {
        Self::with_endpoint(token, FREESOUND_SEARCH_URL)
    }

    pub fn with_endpoint(token: Option<String>, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.token.is_some()
    }

    /// Search by free text. No request is made without a token.
    pub async fn search(&self, query: &str) -> Result<Vec<SoundHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let token = self.token.as_deref().ok_or(SearchError::Unavailable)?;

        debug!("Searching sounds for '{}'", query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("fields", "id,name,previews")])
            .header(AUTHORIZATION, format!("Token {}", token))
            .send()
            .await
            .map_err(|e| SearchError::NetworkFailure(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SearchError::Unauthorized)
            }
            status => return Err(SearchError::HttpStatus(status.as_u16())),
        }

        let page: SearchPage = response
            .json()
            .await
            .map_err(|e| SearchError::NetworkFailure(e.to_string()))?;
        let hits: Vec<SoundHit> = page.results.into_iter().map(SoundHit::from).collect();
        info!("Sound search '{}' found {} sounds", query, hits.len());
        Ok(hits)
    }
}

/// Status line shown next to the results
pub fn status_message(hits: &[SoundHit]) -> String {
    if hits.is_empty() {
        "No results.".to_string()
    } else {
        format!("Found {} sounds.", hits.len())
    }
}

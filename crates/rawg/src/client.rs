//! RAWG API client.
//!
//! Async HTTP client using `reqwest`. RAWG authenticates with a static
//! `key` query parameter on every request.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{GameDetails, Page, SearchResult};

const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api";

/// Fixed result page size for keyword searches.
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Errors from the RAWG client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// RAWG API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Client {
    /// Creates a new client with the given API key.
    pub fn new(api_key: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Points the client at another API root (mirrors, test servers).
    pub fn with_base_url(mut self, url: &str) -> Result<Self, Error> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidBaseUrl(url.to_string()));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Performs a keyed GET request and decodes the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Searches for games by keyword. Returns at most one page of results.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, Error> {
        let params = [
            ("search", query.to_string()),
            ("page_size", SEARCH_PAGE_SIZE.to_string()),
        ];
        let page: Page<SearchResult> = self.get("/games", &params).await?;
        debug!(query, count = page.results.len(), "search completed");
        Ok(page.results)
    }

    /// Fetches the extended record for a single game.
    pub async fn game_details(&self, id: u64) -> Result<GameDetails, Error> {
        self.get(&format!("/games/{id}"), &[]).await
    }
}

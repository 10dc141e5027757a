//! Firestore REST adapter.
//!
//! Writes go through the v1 REST API. Live updates are approximated by
//! polling the collection list and emitting a snapshot whenever its
//! contents change; the first snapshot is emitted right away.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::types::{Document, DocumentStore, Fields, Snapshot, StoreFuture, Subscription};
use crate::value;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_DATABASE: &str = "(default)";
const LIST_PAGE_SIZE: u32 = 300;

/// Path segment escape set: everything but RFC 3986 unreserved characters.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default interval between subscription polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection parameters for a Firestore project.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter when non-empty.
    pub api_key: String,
    pub database: String,
    pub base_url: String,
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    /// Config for the default database of `project_id`.
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Firestore-backed [`DocumentStore`].
#[derive(Clone)]
pub struct FirestoreStore {
    http: reqwest::Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    /// Creates a store for the given project.
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            encode_segment(&self.config.project_id),
            encode_segment(&self.config.database),
            encode_segment(collection),
        )
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url);
        if self.config.api_key.is_empty() {
            req
        } else {
            req.query(&[("key", self.config.api_key.as_str())])
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn create_document(&self, collection: &str, fields: &Fields) -> Result<String, StoreError> {
        let body = json!({ "fields": value::encode_fields(fields) });
        let resp = self
            .request(Method::POST, &self.collection_url(collection))
            .json(&body)
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        let raw: RawDocument = serde_json::from_slice(&resp.bytes().await?)?;
        let id = document_id(&raw.name)?;
        debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.collection_url(collection), encode_segment(id));
        // Without the precondition Firestore reports success for missing documents.
        let resp = self
            .request(Method::DELETE, &url)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Self::check(resp).await?;
        debug!(collection, id, "document deleted");
        Ok(())
    }

    /// Reads every document of a collection, following page tokens.
    pub async fn list(&self, collection: &str) -> Result<Snapshot, StoreError> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self
                .request(Method::GET, &url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let resp = Self::check(req.send().await?).await?;
            let page: ListResponse = serde_json::from_slice(&resp.bytes().await?)?;

            for raw in page.documents {
                let fields = match &raw.fields {
                    Some(f) => value::decode_fields(f)?,
                    None => Fields::new(),
                };
                documents.push(Document {
                    id: document_id(&raw.name)?,
                    fields,
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    fn open_subscription(&self, collection: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let store = self.clone();
        let name = collection.to_string();
        let token = cancel.clone();
        tokio::spawn(async move {
            poll_loop(store, name, tx, token).await;
        });

        Subscription::new(rx, cancel)
    }
}

/// Polls a collection until the subscription is cancelled or dropped.
async fn poll_loop(
    store: FirestoreStore,
    collection: String,
    tx: mpsc::UnboundedSender<crate::types::SnapshotResult>,
    cancel: CancellationToken,
) {
    let mut last: Option<Snapshot> = None;
    let mut ticker = tokio::time::interval(store.config.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let item = match store.list(&collection).await {
            Ok(snapshot) if last.as_ref() == Some(&snapshot) => continue,
            Ok(snapshot) => {
                last = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                warn!(collection = %collection, error = %e, "collection poll failed");
                Err(e)
            }
        };

        if tx.send(item).is_err() {
            break;
        }
    }

    debug!(collection = %collection, "subscription poller stopped");
}

impl DocumentStore for FirestoreStore {
    fn create<'a>(&'a self, collection: &'a str, fields: &'a Fields) -> StoreFuture<'a, String> {
        Box::pin(self.create_document(collection, fields))
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(self.delete_document(collection, id))
    }

    fn subscribe<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Subscription> {
        Box::pin(async move { Ok(self.open_subscription(collection)) })
    }
}

fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

/// Extracts the trailing document id from a full resource name.
fn document_id(name: &str) -> Result<String, StoreError> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidDocument(format!("bad document name: {name}")))
}

//! Domain types for tracked games.

use std::fmt;

use chrono::{DateTime, Utc};
use gametrack_store::{Document, Fields};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// One of the two user-curated lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    CurrentlyPlaying,
    Backlog,
}

impl Collection {
    /// Both collections, in display order.
    pub const ALL: [Collection; 2] = [Collection::CurrentlyPlaying, Collection::Backlog];

    /// Store-side collection name.
    pub fn name(self) -> &'static str {
        match self {
            Collection::CurrentlyPlaying => "currentlyPlaying",
            Collection::Backlog => "backlog",
        }
    }

    /// The opposite list.
    pub fn other(self) -> Self {
        match self {
            Collection::CurrentlyPlaying => Collection::Backlog,
            Collection::Backlog => Collection::CurrentlyPlaying,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A game as stored in a collection.
///
/// `id` is assigned by the store and lives outside the document body;
/// it is `None` until the entity has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEntity {
    #[serde(skip)]
    pub id: Option<String>,
    pub title: String,
    pub platform: String,
    pub description: String,
    pub image: String,
    /// RAWG id. Older documents carry it as `rawgId`.
    #[serde(default, alias = "rawgId", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<u64>,
    pub added_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl GameEntity {
    /// Document body for a store write. Never includes the id.
    pub fn to_fields(&self) -> Result<Fields, TrackerError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(TrackerError::Json(serde::ser::Error::custom(format!(
                "expected a JSON object, got {other}"
            )))),
        }
    }

    /// Decodes a stored document and tags it with its id.
    pub fn from_document(doc: &Document) -> Result<Self, TrackerError> {
        let mut entity: GameEntity =
            serde_json::from_value(serde_json::Value::Object(doc.fields.clone()))?;
        entity.id = Some(doc.id.clone());
        Ok(entity)
    }
}

/// Detail-view model: a stored game plus provider-only extras.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedGame {
    pub game: GameEntity,
    pub screenshots: Vec<String>,
    pub metacritic: Option<u32>,
    pub released: Option<String>,
}

impl From<GameEntity> for EnrichedGame {
    fn from(game: GameEntity) -> Self {
        Self {
            game,
            screenshots: Vec::new(),
            metacritic: None,
            released: None,
        }
    }
}

//! API response types for RAWG.

use serde::{Deserialize, Deserializer, Serialize};

/// A game search result from the `/games` endpoint.
///
/// Every field except `id` and `name` may be missing or `null` upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformEntry>>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub description_raw: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl SearchResult {
    /// Platform names in provider order, or `None` when the provider sent no list.
    pub fn platform_names(&self) -> Option<Vec<&str>> {
        self.platforms
            .as_ref()
            .map(|list| list.iter().map(|p| p.platform.name.as_str()).collect())
    }
}

/// Wrapper around a platform descriptor, as RAWG nests it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub platform: Platform,
}

/// A platform descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}

/// Extended record from `/games/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub description_raw: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub metacritic: Option<u32>,
    #[serde(default)]
    pub released: Option<String>,
}

/// A screenshot reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    #[serde(default)]
    pub id: u64,
    pub image: String,
}

/// Paged list wrapper (internal).
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Page<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<T>,
}

/// Reads a list that RAWG may send as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

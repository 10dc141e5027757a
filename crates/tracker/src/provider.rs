//! Search provider seam.

use std::future::Future;
use std::pin::Pin;

use gametrack_rawg::{GameDetails, SearchResult};

use crate::error::TrackerError;

/// Boxed future returned by [`SearchProvider`] operations.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TrackerError>> + Send + 'a>>;

/// Abstract game-metadata search API.
///
/// The host wires in [`gametrack_rawg::Client`]; tests supply canned data.
pub trait SearchProvider: Send + Sync {
    /// Keyword search, one fixed-size page of results.
    fn search<'a>(&'a self, query: &'a str) -> ProviderFuture<'a, Vec<SearchResult>>;

    /// Extended record for a provider id.
    fn details(&self, external_id: u64) -> ProviderFuture<'_, GameDetails>;
}

impl SearchProvider for gametrack_rawg::Client {
    fn search<'a>(&'a self, query: &'a str) -> ProviderFuture<'a, Vec<SearchResult>> {
        Box::pin(async move { Ok(gametrack_rawg::Client::search(self, query).await?) })
    }

    fn details(&self, external_id: u64) -> ProviderFuture<'_, GameDetails> {
        Box::pin(async move { Ok(self.game_details(external_id).await?) })
    }
}

//! Detail view enrichment from the search provider.

use gametrack_rawg::GameDetails;
use tracing::{debug, warn};

use crate::provider::SearchProvider;
use crate::types::{EnrichedGame, GameEntity};

/// Builds the detail view for a stored game.
///
/// Games without a provider id are returned as-is. A failed lookup is
/// logged and also falls back to the stored fields.
pub async fn enrich(provider: &dyn SearchProvider, entity: &GameEntity) -> EnrichedGame {
    let Some(external_id) = entity.external_id else {
        return EnrichedGame::from(entity.clone());
    };

    match provider.details(external_id).await {
        Ok(details) => {
            debug!(external_id, "detail fetched");
            merge(entity, details)
        }
        Err(e) => {
            warn!(external_id, error = %e, "detail fetch failed, showing stored fields");
            EnrichedGame::from(entity.clone())
        }
    }
}

fn merge(entity: &GameEntity, details: GameDetails) -> EnrichedGame {
    let description = details
        .description_raw
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| entity.description.clone());

    EnrichedGame {
        game: GameEntity {
            description,
            ..entity.clone()
        },
        screenshots: details.screenshots.into_iter().map(|s| s.image).collect(),
        metacritic: details.metacritic,
        released: details.released,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::provider::ProviderFuture;
    use chrono::Utc;
    use gametrack_rawg::{Screenshot, SearchResult};
    use std::sync::Mutex;

    /// Provider returning one canned detail response, recording lookups.
    struct MockProvider {
        details: Mutex<Option<Result<GameDetails, TrackerError>>>,
        lookups: Mutex<Vec<u64>>,
    }

    impl MockProvider {
        fn new(details: Result<GameDetails, TrackerError>) -> Self {
            Self {
                details: Mutex::new(Some(details)),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    impl SearchProvider for MockProvider {
        fn search<'a>(&'a self, _query: &'a str) -> ProviderFuture<'a, Vec<SearchResult>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn details(&self, external_id: u64) -> ProviderFuture<'_, GameDetails> {
            self.lookups.lock().unwrap().push(external_id);
            let canned = self.details.lock().unwrap().take();
            Box::pin(async move {
                canned.unwrap_or_else(|| Err(TrackerError::Network(gametrack_rawg::Error::Api {
                    status: 500,
                    body: "no canned response".into(),
                })))
            })
        }
    }

    fn entity(external_id: Option<u64>) -> GameEntity {
        GameEntity {
            id: Some("doc".into()),
            title: "Foo".into(),
            platform: "PC".into(),
            description: "Stored text.".into(),
            image: "https://img/foo.jpg".into(),
            external_id,
            added_date: Utc::now(),
            rating: Some(4.5),
        }
    }

    fn offline() -> TrackerError {
        TrackerError::Network(gametrack_rawg::Error::Api {
            status: 504,
            body: "gateway timeout".into(),
        })
    }

    #[tokio::test]
    async fn no_external_id_is_identity() {
        let provider = MockProvider::new(Err(offline()));
        let game = entity(None);

        let enriched = enrich(&provider, &game).await;
        assert_eq!(enriched.game, game);
        assert!(enriched.screenshots.is_empty());
        assert!(enriched.metacritic.is_none());
        assert!(provider.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn merges_extended_fields() {
        let provider = MockProvider::new(Ok(GameDetails {
            id: 42,
            description_raw: Some("Full text.".into()),
            screenshots: vec![Screenshot {
                id: 1,
                image: "https://img/s1.jpg".into(),
            }],
            metacritic: Some(91),
            released: Some("2019-10-25".into()),
        }));
        let game = entity(Some(42));

        let enriched = enrich(&provider, &game).await;
        assert_eq!(enriched.game.description, "Full text.");
        assert_eq!(enriched.game.title, "Foo");
        assert_eq!(enriched.game.id, game.id);
        assert_eq!(enriched.screenshots, vec!["https://img/s1.jpg"]);
        assert_eq!(enriched.metacritic, Some(91));
        assert_eq!(enriched.released.as_deref(), Some("2019-10-25"));
        assert_eq!(*provider.lookups.lock().unwrap(), vec![42]);
    }

    #[tokio::test]
    async fn missing_description_keeps_stored_one() {
        let provider = MockProvider::new(Ok(GameDetails {
            id: 42,
            description_raw: Some(String::new()),
            ..Default::default()
        }));
        let enriched = enrich(&provider, &entity(Some(42))).await;
        assert_eq!(enriched.game.description, "Stored text.");
    }

    #[tokio::test]
    async fn failed_fetch_returns_original() {
        let provider = MockProvider::new(Err(offline()));
        let game = entity(Some(42));

        let enriched = enrich(&provider, &game).await;
        assert_eq!(enriched, EnrichedGame::from(game));
    }
}

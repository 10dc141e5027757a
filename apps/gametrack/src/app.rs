//! Application orchestrator. Wires the store, the search client and the
//! tracker session together.

use std::collections::HashMap;
use std::sync::Arc;

use gametrack_rawg::Client as RawgClient;
use gametrack_store::{DocumentStore, FirestoreStore, MemoryStore};
use gametrack_tracker::{Collection, GameEntity, SearchProvider, Tracker, TrackerState};

use crate::config::Config;

/// Runs the tracker until shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    // -- Search provider --
    if config.rawg_api_key.is_empty() {
        tracing::warn!("rawg_api_key is not set, searches will be rejected");
    }
    let provider: Arc<dyn SearchProvider> = Arc::new(RawgClient::new(&config.rawg_api_key)?);

    // -- Store --
    let store: Arc<dyn DocumentStore> = match config.firestore() {
        Some(firestore) => {
            tracing::info!(
                project = %firestore.project_id,
                poll_secs = firestore.poll_interval.as_secs(),
                "using Firestore store"
            );
            Arc::new(FirestoreStore::new(firestore)?)
        }
        None => {
            tracing::info!("no store project configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // -- Session --
    let mut tracker = Tracker::start(store, provider, config.defaults()).await?;
    let mut seen = ListTitles::default();

    tracing::info!("tracker ready");

    // -- Main loop: apply subscription events until shutdown --
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            open = tracker.next_event() => {
                if !open {
                    tracing::warn!("subscriptions closed");
                    break;
                }
                seen.log_changes(tracker.state());
            }
        }
    }

    // -- Graceful shutdown --
    tracing::info!("releasing subscriptions...");
    tracker.shutdown().await;

    Ok(())
}

/// Last logged contents of each list, by document id.
#[derive(Default)]
struct ListTitles {
    lists: HashMap<Collection, Vec<(String, String)>>,
}

impl ListTitles {
    /// Logs games that entered or left a list since the last call.
    fn log_changes(&mut self, state: &TrackerState) {
        for collection in Collection::ALL {
            let current: Vec<(String, String)> =
                state.games(collection).iter().filter_map(keyed).collect();
            let previous = self.lists.entry(collection).or_default();
            if *previous == current {
                continue;
            }

            for (id, title) in current.iter().filter(|g| !previous.contains(g)) {
                tracing::info!(collection = %collection, id = %id, title = %title, "game listed");
            }
            for (id, title) in previous.iter().filter(|g| !current.contains(g)) {
                tracing::info!(collection = %collection, id = %id, title = %title, "game unlisted");
            }
            tracing::info!(collection = %collection, count = current.len(), "list updated");

            *previous = current;
        }
    }
}

fn keyed(game: &GameEntity) -> Option<(String, String)> {
    game.id.clone().map(|id| (id, game.title.clone()))
}

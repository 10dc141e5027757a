//! Client-visible tracker state.
//!
//! [`TrackerState`] is the only place the two lists, the search results and
//! the selection live. It changes exclusively through
//! [`TrackerState::apply`]; subscription tasks and user operations both
//! produce [`TrackerEvent`]s and the owning session applies them one at a
//! time. All methods are synchronous.

use gametrack_rawg::SearchResult;
use tracing::{debug, warn};

use crate::types::{Collection, EnrichedGame, GameEntity};

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Full current contents of a collection.
    Snapshot {
        collection: Collection,
        games: Vec<GameEntity>,
    },
    /// The subscription stream for a collection reported an error.
    SubscriptionFailed {
        collection: Collection,
        reason: String,
    },
    /// A keyword search finished (or failed, with no results).
    SearchCompleted(Vec<SearchResult>),
    /// The search panel was dismissed.
    SearchCleared,
    /// A game was opened in the detail view.
    Selected(EnrichedGame),
    /// The detail view was closed.
    SelectionCleared,
    /// A document was deleted by the user.
    Removed { collection: Collection, id: String },
}

/// Lists, search results and selection.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    currently_playing: Vec<GameEntity>,
    backlog: Vec<GameEntity>,
    selected: Option<EnrichedGame>,
    search_results: Vec<SearchResult>,
}

impl TrackerState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub fn apply(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Snapshot { collection, games } => {
                debug!(collection = %collection, count = games.len(), "snapshot applied");
                *self.list_mut(collection) = games;
            }
            TrackerEvent::SubscriptionFailed { collection, reason } => {
                warn!(collection = %collection, reason = %reason, "subscription error, keeping last list");
            }
            TrackerEvent::SearchCompleted(results) => self.search_results = results,
            TrackerEvent::SearchCleared => self.search_results.clear(),
            TrackerEvent::Selected(game) => self.selected = Some(game),
            TrackerEvent::SelectionCleared => self.selected = None,
            TrackerEvent::Removed { collection, id } => {
                if self.selected_id() == Some(id.as_str()) {
                    debug!(collection = %collection, id = %id, "selected game removed, clearing selection");
                    self.selected = None;
                }
            }
        }
    }

    /// Games in a collection, in store order.
    pub fn games(&self, collection: Collection) -> &[GameEntity] {
        match collection {
            Collection::CurrentlyPlaying => &self.currently_playing,
            Collection::Backlog => &self.backlog,
        }
    }

    /// Finds the list holding a game with the given provider id.
    pub fn locate_external(&self, external_id: u64) -> Option<(Collection, &GameEntity)> {
        self.find(|g| g.external_id == Some(external_id))
    }

    /// Finds the list holding the document with the given store id.
    pub fn locate_id(&self, id: &str) -> Option<(Collection, &GameEntity)> {
        self.find(|g| g.id.as_deref() == Some(id))
    }

    /// The game open in the detail view.
    pub fn selected(&self) -> Option<&EnrichedGame> {
        self.selected.as_ref()
    }

    /// Results of the latest search.
    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().and_then(|s| s.game.id.as_deref())
    }

    fn find(&self, pred: impl Fn(&GameEntity) -> bool) -> Option<(Collection, &GameEntity)> {
        Collection::ALL.into_iter().find_map(|c| {
            self.games(c).iter().find(|g| pred(g)).map(|g| (c, g))
        })
    }

    fn list_mut(&mut self, collection: Collection) -> &mut Vec<GameEntity> {
        match collection {
            Collection::CurrentlyPlaying => &mut self.currently_playing,
            Collection::Backlog => &mut self.backlog,
        }
    }
}

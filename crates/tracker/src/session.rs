//! Tracker session: the single owner of client-visible state.
//!
//! User operations take `&mut self` and subscription snapshots arrive over
//! a channel, so every state change is applied by one owner, one event at a
//! time. Every error is logged here and turned into an unchanged (or empty)
//! state; nothing below the UI sees a failure.

use std::sync::Arc;

use gametrack_rawg::SearchResult;
use gametrack_store::DocumentStore;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::enrich::enrich;
use crate::error::TrackerError;
use crate::membership::MembershipController;
use crate::normalize::Defaults;
use crate::projector::Projector;
use crate::provider::SearchProvider;
use crate::state::{TrackerEvent, TrackerState};
use crate::types::{Collection, GameEntity};

/// Capacity of the subscription event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A running tracker bound to one store and one search provider.
pub struct Tracker {
    store: Arc<dyn DocumentStore>,
    provider: Arc<dyn SearchProvider>,
    membership: MembershipController,
    state: TrackerState,
    pending: PendingWrites,
    projector: Option<Projector>,
    events_rx: mpsc::Receiver<TrackerEvent>,
}

impl Tracker {
    /// Opens both collection subscriptions and returns the session.
    ///
    /// Fails only if a subscription cannot be established.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn SearchProvider>,
        defaults: Defaults,
    ) -> Result<Self, TrackerError> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let projector = Projector::start(store.as_ref(), events_tx).await?;

        Ok(Self {
            store,
            provider,
            membership: MembershipController::new(defaults),
            state: TrackerState::new(),
            pending: PendingWrites::default(),
            projector: Some(projector),
            events_rx,
        })
    }

    /// Current state.
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Waits for the next subscription event and applies it.
    ///
    /// Returns `false` once the subscriptions have been released.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Applies every subscription event that is already queued.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Runs a keyword search and replaces the search results.
    ///
    /// Blank queries are ignored. A failed search leaves no results.
    pub async fn search(&mut self, query: &str) -> usize {
        let query = query.trim();
        if query.is_empty() {
            return self.state.search_results().len();
        }

        let results = match self.provider.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "search failed");
                Vec::new()
            }
        };
        let count = results.len();
        self.state.apply(TrackerEvent::SearchCompleted(results));
        count
    }

    /// Adds a search result to `target`.
    ///
    /// If the game is already tracked it is not duplicated: a game already
    /// in `target` is left alone, and one in the other list is moved.
    pub async fn add(&mut self, result: &SearchResult, target: Collection) -> bool {
        self.drain_events();

        if let Some((collection, existing)) = self.locate(|g| g.external_id == Some(result.id)) {
            if collection == target {
                debug!(collection = %target, external_id = result.id, "game already in list");
                self.state.apply(TrackerEvent::SearchCleared);
                return true;
            }
            let moved = self.move_to(&existing, target).await;
            if moved {
                self.state.apply(TrackerEvent::SearchCleared);
            }
            return moved;
        }

        match self
            .membership
            .add(self.store.as_ref(), result, target)
            .await
        {
            Ok(added) => {
                self.pending.insert(target, added);
                self.state.apply(TrackerEvent::SearchCleared);
                true
            }
            Err(e) => {
                warn!(collection = %target, external_id = result.id, error = %e, "add failed");
                false
            }
        }
    }

    /// Moves a game into `target` and closes the detail view.
    ///
    /// The entity may be a stored game or an unsaved one built from a search
    /// result; either way the tracked copy, if any, is the one that moves.
    pub async fn move_to(&mut self, entity: &GameEntity, target: Collection) -> bool {
        self.drain_events();

        let entity = match self.tracked_copy(entity) {
            Some((current, _)) if current == target => {
                debug!(collection = %target, title = %entity.title, "game already in target list");
                self.state.apply(TrackerEvent::SelectionCleared);
                return true;
            }
            Some((_, stored)) => stored,
            None => entity.clone(),
        };

        match self
            .membership
            .move_to(self.store.as_ref(), &entity, target)
            .await
        {
            Ok(moved) => {
                if let Some(old_id) = entity.id.as_deref() {
                    self.pending.delete(target.other(), old_id);
                }
                self.pending.insert(target, moved);
                self.state.apply(TrackerEvent::SelectionCleared);
                true
            }
            Err(e @ TrackerError::PartialMove { .. }) => {
                error!(title = %entity.title, error = %e, "move left a duplicate");
                false
            }
            Err(e) => {
                warn!(collection = %target, title = %entity.title, error = %e, "move failed");
                false
            }
        }
    }

    /// Deletes a game from a collection, clearing the selection if it was open.
    pub async fn remove(&mut self, id: &str, collection: Collection) -> bool {
        match self
            .membership
            .remove_from(self.store.as_ref(), id, collection)
            .await
        {
            Ok(()) => {
                self.pending.delete(collection, id);
                self.state.apply(TrackerEvent::Removed {
                    collection,
                    id: id.to_string(),
                });
                true
            }
            Err(e) => {
                warn!(collection = %collection, id, error = %e, "remove failed");
                false
            }
        }
    }

    /// Opens a game in the detail view, enriched from the provider.
    pub async fn select(&mut self, entity: &GameEntity) {
        let enriched = enrich(self.provider.as_ref(), entity).await;
        self.state.apply(TrackerEvent::Selected(enriched));
    }

    /// Closes the detail view.
    pub fn clear_selection(&mut self) {
        self.state.apply(TrackerEvent::SelectionCleared);
    }

    /// Releases both subscriptions. Queued events are still applied.
    pub async fn shutdown(mut self) {
        if let Some(projector) = self.projector.take() {
            projector.shutdown().await;
        }
        let applied = self.drain_events();
        info!(applied, "tracker stopped");
    }

    fn apply(&mut self, event: TrackerEvent) {
        if let TrackerEvent::Snapshot { collection, games } = &event {
            self.pending.confirm(*collection, games);
        }
        self.state.apply(event);
    }

    /// The tracked copy of `entity`: by store id, else by provider id.
    fn tracked_copy(&self, entity: &GameEntity) -> Option<(Collection, GameEntity)> {
        if let Some(id) = entity.id.as_deref() {
            if let found @ Some(_) = self.locate(|g| g.id.as_deref() == Some(id)) {
                return found;
            }
        }
        let external_id = entity.external_id?;
        self.locate(|g| g.external_id == Some(external_id))
    }

    /// Finds a game across the projected lists and this session's
    /// unconfirmed writes.
    fn locate(&self, matches: impl Fn(&GameEntity) -> bool) -> Option<(Collection, GameEntity)> {
        if let Some((c, g)) = self.pending.inserted.iter().rev().find(|(_, g)| matches(g)) {
            return Some((*c, g.clone()));
        }
        Collection::ALL.into_iter().find_map(|c| {
            self.state
                .games(c)
                .iter()
                .find(|g| matches(g) && !self.pending.is_deleted(c, g.id.as_deref()))
                .map(|g| (c, g.clone()))
        })
    }
}

/// Writes made by this session that no snapshot has reflected yet.
///
/// Lists only change on snapshots, so without this a second operation
/// issued before the first one's snapshot arrives would not see it.
#[derive(Debug, Default)]
struct PendingWrites {
    inserted: Vec<(Collection, GameEntity)>,
    deleted: Vec<(Collection, String)>,
}

impl PendingWrites {
    fn insert(&mut self, collection: Collection, game: GameEntity) {
        self.inserted.push((collection, game));
    }

    fn delete(&mut self, collection: Collection, id: &str) {
        self.inserted
            .retain(|(c, g)| !(*c == collection && g.id.as_deref() == Some(id)));
        self.deleted.push((collection, id.to_string()));
    }

    fn is_deleted(&self, collection: Collection, id: Option<&str>) -> bool {
        id.is_some_and(|id| self.deleted.iter().any(|(c, d)| *c == collection && d == id))
    }

    /// Drops entries a snapshot of `collection` has caught up with.
    fn confirm(&mut self, collection: Collection, games: &[GameEntity]) {
        let listed = |id: &str| games.iter().any(|g| g.id.as_deref() == Some(id));
        self.inserted
            .retain(|(c, g)| *c != collection || !g.id.as_deref().is_some_and(listed));
        self.deleted.retain(|(c, id)| *c != collection || listed(id));
    }
}

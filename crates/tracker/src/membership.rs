//! Collection membership: add, move and remove.
//!
//! A move is create-in-target followed by delete-from-source. The two store
//! calls are not atomic, so a failed source delete is compensated by
//! deleting the fresh copy again. Only when that rollback also fails is the
//! game left in both lists, and that is reported as
//! [`TrackerError::PartialMove`].

use gametrack_rawg::SearchResult;
use gametrack_store::{DocumentStore, StoreError};
use tracing::{debug, error, info, warn};

use crate::error::TrackerError;
use crate::normalize::{Defaults, normalize};
use crate::types::{Collection, GameEntity};

/// Applies membership changes against a document store.
#[derive(Debug, Clone, Default)]
pub struct MembershipController {
    defaults: Defaults,
}

impl MembershipController {
    /// Creates a controller that normalizes with the given fallbacks.
    pub fn new(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// Fallback values used when normalizing search results.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Normalizes a search result and stores it in `target`.
    ///
    /// Returns the stored entity tagged with its new id.
    pub async fn add(
        &self,
        store: &dyn DocumentStore,
        result: &SearchResult,
        target: Collection,
    ) -> Result<GameEntity, TrackerError> {
        let entity = normalize(result, &self.defaults);
        let id = self.insert(store, &entity, target).await?;
        info!(collection = %target, id = %id, title = %entity.title, "game added");
        Ok(GameEntity {
            id: Some(id),
            ..entity
        })
    }

    /// Moves an entity into `target`, removing it from the other list.
    ///
    /// The entity keeps every field, including `added_date`; only its id
    /// changes. An entity without an id is simply inserted.
    pub async fn move_to(
        &self,
        store: &dyn DocumentStore,
        entity: &GameEntity,
        target: Collection,
    ) -> Result<GameEntity, TrackerError> {
        let new_id = self.insert(store, entity, target).await?;
        let moved = GameEntity {
            id: Some(new_id.clone()),
            ..entity.clone()
        };

        let Some(old_id) = entity.id.as_deref() else {
            debug!(collection = %target, id = %new_id, "moved entity had no prior id");
            return Ok(moved);
        };

        let source = target.other();
        match store.delete(source.name(), old_id).await {
            Ok(()) => {
                info!(from = %source, to = %target, id = %new_id, title = %entity.title, "game moved");
                Ok(moved)
            }
            Err(StoreError::NotFound { .. }) => {
                // Already gone from the source; the new copy is the only one.
                debug!(collection = %source, id = old_id, "source copy already absent");
                Ok(moved)
            }
            Err(e) => {
                warn!(collection = %source, id = old_id, error = %e, "source delete failed, rolling back move");
                self.roll_back(store, target, &new_id, e).await
            }
        }
    }

    /// Deletes a document from a collection.
    pub async fn remove_from(
        &self,
        store: &dyn DocumentStore,
        id: &str,
        collection: Collection,
    ) -> Result<(), TrackerError> {
        store
            .delete(collection.name(), id)
            .await
            .map_err(TrackerError::StoreWrite)?;
        info!(collection = %collection, id, "game removed");
        Ok(())
    }

    async fn insert(
        &self,
        store: &dyn DocumentStore,
        entity: &GameEntity,
        target: Collection,
    ) -> Result<String, TrackerError> {
        let fields = entity.to_fields()?;
        store
            .create(target.name(), &fields)
            .await
            .map_err(TrackerError::StoreWrite)
    }

    async fn roll_back(
        &self,
        store: &dyn DocumentStore,
        target: Collection,
        new_id: &str,
        cause: StoreError,
    ) -> Result<GameEntity, TrackerError> {
        match store.delete(target.name(), new_id).await {
            Ok(()) => Err(TrackerError::StoreWrite(cause)),
            Err(rollback) => {
                error!(
                    collection = %target,
                    id = new_id,
                    error = %rollback,
                    "rollback failed, game is now in both lists"
                );
                Err(TrackerError::PartialMove {
                    collection: target,
                    id: new_id.to_string(),
                })
            }
        }
    }
}

//! In-process document store.
//!
//! Keeps each collection in insertion order and pushes the full collection
//! to every live subscriber after each write. Used by the host when no
//! remote project is configured, and by tests, which can inject failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StoreError;
use crate::types::{
    Document, DocumentStore, Fields, Snapshot, SnapshotResult, StoreFuture, Subscription,
};

/// In-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    failing_creates: u32,
    failing_deletes: u32,
}

struct Subscriber {
    tx: mpsc::UnboundedSender<SnapshotResult>,
    cancel: CancellationToken,
}

impl Subscriber {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tx.is_closed()
    }
}

impl Inner {
    fn snapshot(&self, collection: &str) -> Snapshot {
        self.collections.get(collection).cloned().unwrap_or_default()
    }

    /// Sends the current contents to every live subscriber of `collection`
    /// and forgets the ones that went away.
    fn publish(&mut self, collection: &str) {
        let snapshot = self.snapshot(collection);
        if let Some(subs) = self.subscribers.get_mut(collection) {
            subs.retain(|s| s.is_live() && s.tx.send(Ok(snapshot.clone())).is_ok());
        }
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Snapshot {
        self.lock().snapshot(collection)
    }

    /// Makes the next `n` create calls fail with [`StoreError::Rejected`].
    pub fn fail_creates(&self, n: u32) {
        self.lock().failing_creates = n;
    }

    /// Makes the next `n` delete calls fail with [`StoreError::Rejected`].
    pub fn fail_deletes(&self, n: u32) {
        self.lock().failing_deletes = n;
    }

    /// Delivers a stream error to every subscriber of `collection`.
    pub fn break_stream(&self, collection: &str, reason: &str) {
        let mut inner = self.lock();
        if let Some(subs) = inner.subscribers.get_mut(collection) {
            subs.retain(|s| {
                s.is_live()
                    && s
                        .tx
                        .send(Err(StoreError::Rejected(reason.to_string())))
                        .is_ok()
            });
        }
    }

    /// Number of subscriptions on `collection` that are still open.
    pub fn live_subscribers(&self, collection: &str) -> usize {
        self.lock()
            .subscribers
            .get(collection)
            .map(|subs| subs.iter().filter(|s| s.is_live()).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn create_now(&self, collection: &str, fields: &Fields) -> Result<String, StoreError> {
        let mut inner = self.lock();
        if inner.failing_creates > 0 {
            inner.failing_creates -= 1;
            return Err(StoreError::Rejected("injected create failure".into()));
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields: fields.clone(),
            });
        debug!(collection, id = %id, "document created");
        inner.publish(collection);
        Ok(id)
    }

    fn delete_now(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.failing_deletes > 0 {
            inner.failing_deletes -= 1;
            return Err(StoreError::Rejected("injected delete failure".into()));
        }

        let docs = inner.collections.entry(collection.to_string()).or_default();
        let Some(pos) = docs.iter().position(|d| d.id == id) else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };
        docs.remove(pos);
        debug!(collection, id, "document deleted");
        inner.publish(collection);
        Ok(())
    }

    fn subscribe_now(&self, collection: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let mut inner = self.lock();
        let _ = tx.send(Ok(inner.snapshot(collection)));
        inner
            .subscribers
            .entry(collection.to_string())
            .or_default()
            .push(Subscriber {
                tx,
                cancel: cancel.clone(),
            });

        Subscription::new(rx, cancel)
    }
}

impl DocumentStore for MemoryStore {
    fn create<'a>(&'a self, collection: &'a str, fields: &'a Fields) -> StoreFuture<'a, String> {
        Box::pin(async move { self.create_now(collection, fields) })
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.delete_now(collection, id) })
    }

    fn subscribe<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Subscription> {
        Box::pin(async move { Ok(self.subscribe_now(collection)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(title: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("title".into(), json!(title));
        f
    }

    fn titles(snapshot: &Snapshot) -> Vec<&str> {
        snapshot
            .iter()
            .map(|d| d.fields["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids_in_order() {
        let store = MemoryStore::new();
        let a = store.create("backlog", &fields("A")).await.unwrap();
        let b = store.create("backlog", &fields("B")).await.unwrap();

        assert_ne!(a, b);
        let docs = store.documents("backlog");
        assert_eq!(titles(&docs), vec!["A", "B"]);
        assert_eq!(docs[0].id, a);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete("backlog", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_and_updates() {
        let store = MemoryStore::new();
        store.create("backlog", &fields("A")).await.unwrap();

        let mut sub = store.subscribe("backlog").await.unwrap();
        let initial = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&initial), vec!["A"]);

        let id = store.create("backlog", &fields("B")).await.unwrap();
        let after_create = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&after_create), vec!["A", "B"]);

        store.delete("backlog", &id).await.unwrap();
        let after_delete = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&after_delete), vec!["A"]);
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = MemoryStore::new();
        let mut backlog = store.subscribe("backlog").await.unwrap();
        let _ = backlog.next().await;

        store.create("currentlyPlaying", &fields("X")).await.unwrap();
        assert!(store.documents("backlog").is_empty());
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(50), backlog.next()).await;
        assert!(pending.is_err(), "backlog subscriber saw a foreign write");
    }

    #[tokio::test]
    async fn dropped_subscription_is_forgotten() {
        let store = MemoryStore::new();
        let sub = store.subscribe("backlog").await.unwrap();
        assert_eq!(store.live_subscribers("backlog"), 1);

        drop(sub);
        assert_eq!(store.live_subscribers("backlog"), 0);

        // Publishing after the drop must not fail.
        store.create("backlog", &fields("A")).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_none() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("backlog").await.unwrap();
        sub.cancel();
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_creates(1);
        assert!(matches!(
            store.create("backlog", &fields("A")).await,
            Err(StoreError::Rejected(_))
        ));
        let id = store.create("backlog", &fields("A")).await.unwrap();

        store.fail_deletes(1);
        assert!(store.delete("backlog", &id).await.is_err());
        store.delete("backlog", &id).await.unwrap();
    }

    #[tokio::test]
    async fn break_stream_sends_error() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("backlog").await.unwrap();
        let _ = sub.next().await;

        store.break_stream("backlog", "offline");
        assert!(sub.next().await.unwrap().is_err());
    }
}

//! Live view projection of both collections.
//!
//! One standing subscription per collection, each forwarded by its own task
//! into the session's event channel. The forwarders never touch state; the
//! session applies what they send.

use gametrack_store::{DocumentStore, Snapshot, Subscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TrackerError;
use crate::state::TrackerEvent;
use crate::types::{Collection, GameEntity};

/// Owns the two collection subscriptions.
///
/// Both are released by [`shutdown`](Self::shutdown), or when the projector
/// is dropped.
pub struct Projector {
    cancel: CancellationToken,
    subscriptions: Vec<CancellationToken>,
    tasks: Vec<JoinHandle<()>>,
}

impl Projector {
    /// Subscribes to both collections and starts forwarding snapshots.
    pub async fn start(
        store: &dyn DocumentStore,
        events: mpsc::Sender<TrackerEvent>,
    ) -> Result<Self, TrackerError> {
        let mut projector = Self {
            cancel: CancellationToken::new(),
            subscriptions: Vec::with_capacity(Collection::ALL.len()),
            tasks: Vec::with_capacity(Collection::ALL.len()),
        };

        for collection in Collection::ALL {
            // On error `projector` drops here and cancels anything already started.
            let sub = store
                .subscribe(collection.name())
                .await
                .map_err(TrackerError::StoreSubscription)?;
            projector.subscriptions.push(sub.cancel_token());
            let cancel = projector.cancel.child_token();
            let events = events.clone();
            projector
                .tasks
                .push(tokio::spawn(forward(collection, sub, events, cancel)));
        }

        info!("collection subscriptions started");
        Ok(projector)
    }

    /// Whether the subscriptions are still open.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancels both subscriptions and waits for their forwarders to exit.
    pub async fn shutdown(mut self) {
        self.release();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "subscription forwarder panicked");
            }
        }
        info!("collection subscriptions released");
    }

    fn release(&self) {
        self.cancel.cancel();
        for sub in &self.subscriptions {
            sub.cancel();
        }
    }
}

impl Drop for Projector {
    fn drop(&mut self) {
        self.release();
    }
}

/// Forwards one subscription into the event channel until cancelled.
async fn forward(
    collection: Collection,
    mut sub: Subscription,
    events: mpsc::Sender<TrackerEvent>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = sub.next() => item,
        };

        let Some(item) = item else {
            debug!(collection = %collection, "subscription stream ended");
            break;
        };

        let event = match item {
            Ok(snapshot) => TrackerEvent::Snapshot {
                collection,
                games: project(collection, &snapshot),
            },
            Err(e) => TrackerEvent::SubscriptionFailed {
                collection,
                reason: e.to_string(),
            },
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    debug!(collection = %collection, "event receiver gone");
                    break;
                }
            }
        }
    }

    sub.cancel();
}

/// Decodes a snapshot, skipping documents that are not valid games.
pub fn project(collection: Collection, snapshot: &Snapshot) -> Vec<GameEntity> {
    snapshot
        .iter()
        .filter_map(|doc| match GameEntity::from_document(doc) {
            Ok(game) => Some(game),
            Err(e) => {
                warn!(collection = %collection, id = %doc.id, error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}

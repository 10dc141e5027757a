//! Document store access for GameTrack.
//!
//! A store exposes named collections of JSON documents keyed by opaque,
//! store-assigned ids. The tracker consumes three operations through the
//! [`DocumentStore`] trait: create, delete, and a standing subscription
//! that redelivers the full collection on every change.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process, insertion ordered, with failure injection
//! - [`FirestoreStore`]: Firestore REST v1, subscriptions by polling

pub mod error;
pub mod firestore;
pub mod memory;
pub mod types;
pub mod value;

pub use error::StoreError;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
pub use types::{Document, DocumentStore, Fields, Snapshot, SnapshotResult, StoreFuture, Subscription};

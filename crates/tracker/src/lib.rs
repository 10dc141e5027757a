//! GameTrack list management.
//!
//! Keeps two lists of games, "currently playing" and "backlog", in a
//! [`DocumentStore`](gametrack_store::DocumentStore) and projects them into
//! client-visible [`TrackerState`]. A game lives in at most one list; moving
//! it between lists is a create followed by a delete.
//!
//! # Layout
//!
//! - [`normalize`]: search result to stored entity, with all fallbacks
//! - [`membership`]: add, move and remove against the store
//! - [`projector`]: standing subscriptions feeding snapshot events
//! - [`enrich`]: detail view lookup from the search provider
//! - [`state`] / [`session`]: single-owner state and the user operations

pub mod enrich;
pub mod error;
pub mod membership;
pub mod normalize;
pub mod projector;
pub mod provider;
pub mod session;
pub mod state;
pub mod types;

pub use error::TrackerError;
pub use membership::MembershipController;
pub use normalize::{Defaults, NO_DESCRIPTION, PLACEHOLDER_IMAGE, UNKNOWN_PLATFORM, normalize};
pub use projector::Projector;
pub use provider::{ProviderFuture, SearchProvider};
pub use session::Tracker;
pub use state::{TrackerEvent, TrackerState};
pub use types::{Collection, EnrichedGame, GameEntity};

//! RAWG API client for game search and detail lookup.
//!
//! Provides an async client for the [RAWG](https://rawg.io/apidocs)
//! video game database: keyword search with a fixed page size and
//! per-game extended records.

pub mod client;
pub mod types;

pub use client::{Client, Error, SEARCH_PAGE_SIZE};
pub use types::{GameDetails, Platform, PlatformEntry, Screenshot, SearchResult};

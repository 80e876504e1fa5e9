//! Read-only access to universe data
//!
//! The [`UniverseStore`] trait is the seam between the chat handlers and the
//! database. [`RestStore`] talks to the hosted PostgREST API; [`MemoryStore`]
//! serves seeded records in-process.

use crate::universe::{Character, Event, Location, Relationship, Universe, WorldObject};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Database tables consulted when assembling universe context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Universes,
    Characters,
    Locations,
    Events,
    Objects,
    Relationships,
}

impl Table {
    /// Table name, also used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Universes => "universes",
            Table::Characters => "characters",
            Table::Locations => "locations",
            Table::Events => "events",
            Table::Objects => "objects",
            Table::Relationships => "relationships",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single store lookup
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("lookup on {table} failed: {reason}")]
    Request { table: Table, reason: String },

    #[error("lookup on {table} returned status {status}")]
    Status { table: Table, status: u16 },

    #[error("could not decode {table} rows: {reason}")]
    Decode { table: Table, reason: String },

    #[error("{table} is unavailable")]
    Unavailable { table: Table },
}

impl StoreError {
    /// Table the failed lookup targeted
    pub fn table(&self) -> Table {
        match self {
            Self::Request { table, .. }
            | Self::Status { table, .. }
            | Self::Decode { table, .. }
            | Self::Unavailable { table } => *table,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lookups keyed by universe id
///
/// Every list lookup filters on `universe_id`. `events` returns rows in
/// ascending timeline order. An empty result is `Ok(vec![])`, never an error.
#[async_trait]
pub trait UniverseStore: Send + Sync {
    async fn universe(&self, universe_id: &str) -> StoreResult<Option<Universe>>;

    async fn characters(&self, universe_id: &str) -> StoreResult<Vec<Character>>;

    async fn locations(&self, universe_id: &str) -> StoreResult<Vec<Location>>;

    async fn events(&self, universe_id: &str) -> StoreResult<Vec<Event>>;

    async fn objects(&self, universe_id: &str) -> StoreResult<Vec<WorldObject>>;

    async fn relationships(&self, universe_id: &str) -> StoreResult<Vec<Relationship>>;
}

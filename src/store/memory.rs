//! In-process store seeded with records

use super::{StoreError, StoreResult, Table, UniverseStore};
use crate::universe::{Character, Event, Location, Relationship, Universe, WorldObject};
use async_trait::async_trait;
use std::collections::HashSet;

/// Store backed by plain vectors
///
/// Lookups filter by universe id the same way the database does. Events are
/// returned in ascending `timeline_position` order with unpositioned events
/// last (Postgres `ASC NULLS LAST`), ties keeping insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    universes: Vec<Universe>,
    characters: Vec<Character>,
    locations: Vec<Location>,
    events: Vec<Event>,
    objects: Vec<WorldObject>,
    relationships: Vec<Relationship>,
    failing: HashSet<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_universe(mut self, universe: Universe) -> Self {
        self.universes.push(universe);
        self
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_object(mut self, object: WorldObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Make every lookup on `table` fail with `StoreError::Unavailable`
    pub fn failing(mut self, table: Table) -> Self {
        self.failing.insert(table);
        self
    }

    fn check(&self, table: Table) -> StoreResult<()> {
        if self.failing.contains(&table) {
            return Err(StoreError::Unavailable { table });
        }
        Ok(())
    }
}

fn owned_by<T: Clone>(rows: &[T], universe_id: &str, key: impl Fn(&T) -> &str) -> Vec<T> {
    rows.iter()
        .filter(|row| key(*row) == universe_id)
        .cloned()
        .collect()
}

#[async_trait]
impl UniverseStore for MemoryStore {
    async fn universe(&self, universe_id: &str) -> StoreResult<Option<Universe>> {
        self.check(Table::Universes)?;
        Ok(self.universes.iter().find(|u| u.id == universe_id).cloned())
    }

    async fn characters(&self, universe_id: &str) -> StoreResult<Vec<Character>> {
        self.check(Table::Characters)?;
        Ok(owned_by(&self.characters, universe_id, |c| c.universe_id.as_str()))
    }

    async fn locations(&self, universe_id: &str) -> StoreResult<Vec<Location>> {
        self.check(Table::Locations)?;
        Ok(owned_by(&self.locations, universe_id, |l| l.universe_id.as_str()))
    }

    async fn events(&self, universe_id: &str) -> StoreResult<Vec<Event>> {
        self.check(Table::Events)?;
        let mut events = owned_by(&self.events, universe_id, |e| e.universe_id.as_str());
        events.sort_by_key(|e| (e.timeline_position.is_none(), e.timeline_position));
        Ok(events)
    }

    async fn objects(&self, universe_id: &str) -> StoreResult<Vec<WorldObject>> {
        self.check(Table::Objects)?;
        Ok(owned_by(&self.objects, universe_id, |o| o.universe_id.as_str()))
    }

    async fn relationships(&self, universe_id: &str) -> StoreResult<Vec<Relationship>> {
        self.check(Table::Relationships)?;
        Ok(owned_by(&self.relationships, universe_id, |r| {
            r.universe_id.as_str()
        }))
    }
}

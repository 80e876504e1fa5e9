//! Universe context assembly
//!
//! Loads everything a universe contains from a [`UniverseStore`] and
//! flattens it into the text block injected into the chat system prompt.

use crate::metrics::Metrics;
use crate::store::{StoreResult, UniverseStore};
use crate::universe::{Character, Event, Location, Relationship, Universe, WorldObject};
use serde::{Deserialize, Serialize};

/// Title used when the universe row itself is missing
pub const UNKNOWN_UNIVERSE_TITLE: &str = "Unknown Universe";

/// Everything the store returned for one universe
#[derive(Debug, Clone, Default)]
pub struct UniverseSnapshot {
    pub universe: Option<Universe>,
    pub characters: Vec<Character>,
    pub locations: Vec<Location>,
    pub events: Vec<Event>,
    pub objects: Vec<WorldObject>,
    pub relationships: Vec<Relationship>,
}

/// Per-kind entity counts reported back to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsed {
    pub characters: usize,
    pub locations: usize,
    pub events: usize,
    pub objects: usize,
    pub relationships: usize,
}

/// Load a snapshot, one lookup after another
///
/// A failed lookup is logged, counted, and treated as an empty result so
/// the chat can still proceed with whatever context is available.
pub async fn load_snapshot(
    store: &dyn UniverseStore,
    universe_id: &str,
    metrics: &Metrics,
) -> UniverseSnapshot {
    UniverseSnapshot {
        universe: degrade(store.universe(universe_id).await, universe_id, metrics),
        characters: degrade(store.characters(universe_id).await, universe_id, metrics),
        locations: degrade(store.locations(universe_id).await, universe_id, metrics),
        events: degrade(store.events(universe_id).await, universe_id, metrics),
        objects: degrade(store.objects(universe_id).await, universe_id, metrics),
        relationships: degrade(store.relationships(universe_id).await, universe_id, metrics),
    }
}

fn degrade<T: Default>(result: StoreResult<T>, universe_id: &str, metrics: &Metrics) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                universe_id = %universe_id,
                table = %e.table(),
                error = %e,
                "Store lookup failed, continuing with empty data"
            );
            metrics.record_store_lookup_failure(e.table());
            T::default()
        }
    }
}

impl UniverseSnapshot {
    pub fn counts(&self) -> ContextUsed {
        ContextUsed {
            characters: self.characters.len(),
            locations: self.locations.len(),
            events: self.events.len(),
            objects: self.objects.len(),
            relationships: self.relationships.len(),
        }
    }

    pub fn title(&self) -> &str {
        self.universe
            .as_ref()
            .map(|u| u.title.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or(UNKNOWN_UNIVERSE_TITLE)
    }

    /// Flatten the snapshot into one labeled line per entity kind
    pub fn render_context(&self) -> String {
        let characters = self.characters.iter().map(|c| {
            with_description(
                labeled(&c.name, c.role.as_deref()),
                c.description.as_deref(),
            )
        });
        let locations = self.locations.iter().map(|l| {
            with_description(
                labeled(&l.name, l.location_type.as_deref()),
                l.description.as_deref(),
            )
        });
        let events = self
            .events
            .iter()
            .map(|e| with_description(e.name.clone(), e.description.as_deref()));
        let objects = self.objects.iter().map(|o| {
            let mut entry = with_description(o.name.clone(), o.description.as_deref());
            if let Some(significance) = present(o.significance.as_deref()) {
                entry.push_str(&format!(" (significance: {})", significance));
            }
            entry
        });
        let relationships = self.relationships.iter().map(|r| {
            format!(
                "{} {} {}",
                self.entity_name(&r.source_type, &r.source_id),
                r.relationship_type,
                self.entity_name(&r.target_type, &r.target_id)
            )
        });

        [
            section("Characters", characters),
            section("Locations", locations),
            section("Events", events),
            section("Objects", objects),
            section("Relationships", relationships),
        ]
        .join("\n")
    }

    /// Resolve a relationship endpoint to a display name
    fn entity_name(&self, entity_type: &str, id: &str) -> String {
        let name = match entity_type {
            "character" => self.characters.iter().find(|c| c.id == id).map(|c| &c.name),
            "location" => self.locations.iter().find(|l| l.id == id).map(|l| &l.name),
            "event" => self.events.iter().find(|e| e.id == id).map(|e| &e.name),
            "object" => self.objects.iter().find(|o| o.id == id).map(|o| &o.name),
            _ => None,
        };
        match name {
            Some(name) => name.clone(),
            None => format!("{}:{}", entity_type, id),
        }
    }

    /// System prompt for the universe chat
    pub fn system_prompt(&self, context: &str) -> String {
        let mut prompt = format!(
            "You are a knowledgeable assistant for the fictional universe \"{}\". \
            Answer questions and help the author develop their world, staying consistent \
            with the established lore below. If something is not covered by the lore, \
            say so and offer ideas that fit the setting.",
            self.title()
        );
        if let Some(description) = self
            .universe
            .as_ref()
            .and_then(|u| present(u.description.as_deref()))
        {
            prompt.push_str(&format!("\n\nUniverse description: {}", description));
        }
        prompt.push_str("\n\nUniverse context:\n");
        prompt.push_str(context);
        prompt
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn labeled(name: &str, label: Option<&str>) -> String {
    match present(label) {
        Some(label) => format!("{} ({})", name, label),
        None => name.to_string(),
    }
}

fn with_description(mut entry: String, description: Option<&str>) -> String {
    if let Some(description) = present(description) {
        entry.push_str(" - ");
        entry.push_str(description);
    }
    entry
}

fn section(label: &str, entries: impl Iterator<Item = String>) -> String {
    let entries: Vec<String> = entries.collect();
    if entries.is_empty() {
        format!("{}: None", label)
    } else {
        format!("{}: {}", label, entries.join(", "))
    }
}

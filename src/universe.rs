//! Universe records as stored in the relational database
//!
//! These are read-only views of rows owned by the front-end application.
//! Nullable columns are `Option`; unknown columns are ignored. Identifier
//! and name columns accept numbers and nulls so one odd row cannot fail a
//! whole table.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read a text column that may arrive as a string, a number or null
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// A user-authored fictional setting
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Universe {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Character {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub universe_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub universe_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub universe_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Position on the universe timeline; lower comes first
    #[serde(default)]
    pub timeline_position: Option<i64>,
}

/// An item of significance in a universe (`objects` table)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorldObject {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub universe_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
}

/// A typed edge between two entities of any kind
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Relationship {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub universe_id: String,
    pub source_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source_id: String,
    pub target_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub target_id: String,
    pub relationship_type: String,
}

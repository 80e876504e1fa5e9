//! PostgREST-backed store
//!
//! Each lookup is one `GET {url}/rest/v1/{table}` with PostgREST filter
//! syntax (`universe_id=eq.<id>`). The service key, when configured, is sent
//! both as `apikey` and as a bearer token.

use super::{StoreError, StoreResult, Table, UniverseStore};
use crate::universe::{Character, Event, Location, Relationship, Universe, WorldObject};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl RestStore {
    pub fn new(url: &str, api_key: Option<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key,
            http,
        }
    }

    /// Run a filtered select against `table` and decode the rows
    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        filter: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let url = format!("{}/{}", self.base_url, table.as_str());

        let mut request = self
            .http
            .get(&url)
            .query(&[("select", "*")])
            .query(filter);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| StoreError::Request {
            table,
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                table,
                status: status.as_u16(),
            });
        }

        let rows: Vec<T> = response.json().await.map_err(|e| StoreError::Decode {
            table,
            reason: e.to_string(),
        })?;

        tracing::debug!(table = %table, rows = rows.len(), "Store lookup completed");
        Ok(rows)
    }

    fn by_universe(universe_id: &str) -> (&'static str, String) {
        ("universe_id", format!("eq.{}", universe_id))
    }
}

#[async_trait]
impl UniverseStore for RestStore {
    async fn universe(&self, universe_id: &str) -> StoreResult<Option<Universe>> {
        let rows: Vec<Universe> = self
            .select(Table::Universes, &[("id", format!("eq.{}", universe_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn characters(&self, universe_id: &str) -> StoreResult<Vec<Character>> {
        self.select(Table::Characters, &[Self::by_universe(universe_id)])
            .await
    }

    async fn locations(&self, universe_id: &str) -> StoreResult<Vec<Location>> {
        self.select(Table::Locations, &[Self::by_universe(universe_id)])
            .await
    }

    async fn events(&self, universe_id: &str) -> StoreResult<Vec<Event>> {
        self.select(
            Table::Events,
            &[
                Self::by_universe(universe_id),
                ("order", "timeline_position.asc".to_string()),
            ],
        )
        .await
    }

    async fn objects(&self, universe_id: &str) -> StoreResult<Vec<WorldObject>> {
        self.select(Table::Objects, &[Self::by_universe(universe_id)])
            .await
    }

    async fn relationships(&self, universe_id: &str) -> StoreResult<Vec<Relationship>> {
        self.select(Table::Relationships, &[Self::by_universe(universe_id)])
            .await
    }
}

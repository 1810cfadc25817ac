use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api_model::VisualizationParamsDto;
use crate::error::{self, Result};

/// A registered map: the verbatim call-graph JSON text submitted to
/// `/map`, plus the visualization parameters tile rendering applies by
/// default. Kept as a raw string rather than a parsed `Value` so the
/// eval memo keys on the exact bytes the client sent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MapEntry {
    pub graph: String,
    pub visualization: Option<VisualizationParamsDto>,
}

/// Persists the mapping from a map id to its call graph (spec §4.7
/// "Request boundary" / source `app.py`'s `set_map`/`get_map`).
#[async_trait]
pub trait MapStore: Send + Sync {
    async fn insert(&self, id: Uuid, entry: MapEntry) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<MapEntry>;
}

#[derive(Default)]
pub struct InMemoryMapStore {
    maps: RwLock<HashMap<Uuid, MapEntry>>,
}

impl InMemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MapStore for InMemoryMapStore {
    async fn insert(&self, id: Uuid, entry: MapEntry) -> Result<()> {
        self.maps.write().unwrap().insert(id, entry);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<MapEntry> {
        self.maps
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(error::Error::UnknownMap { id: id.to_string() })
    }
}

/// Stores a map's graph and visualization as two independent Redis
/// entries (source `app.py`'s `set_map`, which writes `maps:<uuid>` and
/// `vis_params:<uuid>` separately) rather than one combined blob, so a
/// client can fetch either half without deserializing the other.
#[cfg(feature = "redis-store")]
pub struct RedisMapStore {
    client: redis::Client,
}

#[cfg(feature = "redis-store")]
impl RedisMapStore {
    pub fn connect(url: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    fn maps_key(id: Uuid) -> String {
        format!("maps:{id}")
    }

    fn vis_params_key(id: Uuid) -> String {
        format!("vis_params:{id}")
    }
}

#[cfg(feature = "redis-store")]
#[async_trait]
impl MapStore for RedisMapStore {
    async fn insert(&self, id: Uuid, entry: MapEntry) -> Result<()> {
        let mut conn = self.client.get_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::maps_key(id))
            .arg(&entry.graph)
            .query_async(&mut conn)
            .await?;

        if let Some(vis) = &entry.visualization {
            let serialized = serde_json::to_string(vis)?;
            redis::cmd("SET")
                .arg(Self::vis_params_key(id))
                .arg(serialized)
                .query_async(&mut conn)
                .await?;
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<MapEntry> {
        let mut conn = self.client.get_async_connection().await?;

        let graph: Option<String> = redis::cmd("GET")
            .arg(Self::maps_key(id))
            .query_async(&mut conn)
            .await?;
        let graph = graph.ok_or(error::Error::UnknownMap { id: id.to_string() })?;

        let vis_raw: Option<String> = redis::cmd("GET")
            .arg(Self::vis_params_key(id))
            .query_async(&mut conn)
            .await?;
        let visualization = vis_raw.map(|raw| serde_json::from_str(&raw)).transpose()?;

        Ok(MapEntry { graph, visualization })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_map_entry() {
        let store = InMemoryMapStore::new();
        let id = Uuid::new_v4();
        let entry = MapEntry {
            graph: r#"{"name": "constant", "args": [1.0]}"#.to_string(),
            visualization: None,
        };
        store.insert(id, entry.clone()).await.unwrap();
        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.graph, entry.graph);
    }

    #[tokio::test]
    async fn unknown_id_is_rejected() {
        let store = InMemoryMapStore::new();
        let result = store.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(error::Error::UnknownMap { .. })));
    }
}

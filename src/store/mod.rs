//! Vector database integration
//!
//! This module provides:
//! - The [`VectorStore`] trait used by ingestion and search
//! - A Qdrant implementation with collection management, upsert and search

mod payload;

pub use payload::*;

use crate::chunk::Chunk;
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, GetCollectionInfoResponse, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::Serialize;
use tracing::{debug, info};

/// Information about a collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub indexed_vectors_count: u64,
    pub status: String,
}

/// A stored chunk paired with its similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub chunk: Chunk,
}

/// Trait for vector databases
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this store writes to
    fn collection_name(&self) -> &str;

    /// Create the collection for vectors of `dimension` if it does not exist
    async fn ensure_collection(&self, dimension: usize) -> Result<()>;

    /// Delete the collection; returns whether it existed
    async fn delete_collection(&self) -> Result<bool>;

    /// Insert or overwrite points
    async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()>;

    /// Top-`limit` most similar stored chunks
    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>>;

    /// Collection info, or `None` if the collection does not exist
    async fn collection_info(&self) -> Result<Option<CollectionInfo>>;
}

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.database_url,
            &config.collection_name,
            config.database_api_key(),
        )
    }

    /// Create a new store connection directly with URL and collection name
    pub fn new(url: &str, collection: &str, api_key: Option<String>) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    async fn collection_vector_size(&self) -> Result<Option<u64>> {
        let info = self.client.collection_info(&self.collection).await?;
        extract_vector_size(&info, &self.collection)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            debug!("Collection {} already exists", self.collection);

            if let Some(size) = self.collection_vector_size().await? {
                if size as usize != dimension {
                    return Err(Error::VectorStore(format!(
                        "Collection '{}' has vector size {}, but the embedding model produces {}. \
                         Remediation: re-run ingestion with --reset or choose another collection name.",
                        self.collection, size, dimension
                    )));
                }
            }

            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, dimension
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    async fn delete_collection(&self) -> Result<bool> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(false);
        }

        info!("Deleting collection {}", self.collection);
        self.client.delete_collection(&self.collection).await?;
        Ok(true)
    }

    async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        debug!(
            "Upserting {} points to collection {}",
            points.len(),
            self.collection
        );

        let point_structs: Vec<PointStruct> =
            points.into_iter().map(|p| p.to_point_struct()).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, point_structs).wait(true))
            .await?;

        Ok(())
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>> {
        debug!(
            "Searching collection {} with limit {}",
            self.collection, limit
        );

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_vector, limit as u64)
                    .with_payload(true),
            )
            .await?;

        let results = response
            .result
            .into_iter()
            .map(|p| SearchResult {
                id: point_id_to_string(p.id),
                score: p.score,
                chunk: ChunkPayload::from_qdrant_payload(p.payload).to_chunk(),
            })
            .collect();

        Ok(results)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(&self.collection).await?;
        Ok(info.result.map(|result| CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            indexed_vectors_count: result.indexed_vectors_count.unwrap_or(0),
            status: format!("{:?}", result.status()),
        }))
    }
}

fn extract_vector_size(info: &GetCollectionInfoResponse, collection: &str) -> Result<Option<u64>> {
    let Some(config) = info
        .result
        .as_ref()
        .and_then(|r| r.config.as_ref())
        .and_then(|c| c.params.as_ref())
        .and_then(|p| p.vectors_config.as_ref())
        .and_then(|v| v.config.as_ref())
    else {
        return Ok(None);
    };

    match config {
        qdrant_client::qdrant::vectors_config::Config::Params(params) => Ok(Some(params.size)),
        qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => Err(Error::VectorStore(
            format!(
                "Collection '{}' uses named vectors which are not supported by this store",
                collection
            ),
        )),
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    match id {
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)),
        }) => uuid,
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)),
        }) => num.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::point_id::PointIdOptions;

    #[test]
    fn test_point_id_to_string() {
        let uuid = point_id_for("doc-0").to_string();
        let id = PointId {
            point_id_options: Some(PointIdOptions::Uuid(uuid.clone())),
        };
        assert_eq!(point_id_to_string(Some(id)), uuid);

        let num = PointId {
            point_id_options: Some(PointIdOptions::Num(42)),
        };
        assert_eq!(point_id_to_string(Some(num)), "42");
        assert_eq!(point_id_to_string(None), "");
    }

    #[test]
    fn test_extract_vector_size_missing_config() {
        let info = GetCollectionInfoResponse::default();
        assert_eq!(extract_vector_size(&info, "c").unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_builds_without_server() {
        let store = QdrantStore::new("http://127.0.0.1:6334", "pdf_chunks", None)
            .expect("store should initialize");
        assert_eq!(store.collection_name(), "pdf_chunks");
    }
}

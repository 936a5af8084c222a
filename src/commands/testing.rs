//! In-memory doubles for the external services used by the commands

use crate::embed::{Embedder, Embedding};
use crate::error::{Error, Result};
use crate::llm::ChatModel;
use crate::parse::{Document, DocumentLoader};
use crate::store::{ChunkPoint, CollectionInfo, SearchResult, VectorStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Returns fixed pages for any path
pub struct StaticLoader {
    pub pages: Vec<String>,
    pub loaded: Mutex<Vec<PathBuf>>,
}

impl StaticLoader {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            loaded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        self.loaded.lock().unwrap().push(path.to_path_buf());
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(page, text)| {
                let mut metadata = Map::new();
                metadata.insert("source".to_string(), Value::from(path.display().to_string()));
                metadata.insert("page".to_string(), Value::from(page));
                metadata.insert("author".to_string(), Value::from(""));
                metadata.insert("subject".to_string(), Value::Null);
                Document::new(text.clone(), metadata)
            })
            .collect())
    }
}

/// Deterministic embeddings of a fixed dimension; can be told to fail
pub struct FakeEmbedder {
    pub dimension: usize,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(3)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0; self.dimension];
        if let Some(first) = vector.first_mut() {
            *first = text.chars().count() as f32;
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("embedding service unavailable".to_string()));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("embedding service unavailable".to_string()));
        }
        Ok(self.vector_for(text))
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

/// Records writes and serves canned search results
#[derive(Default)]
pub struct MemoryStore {
    pub points: Mutex<Vec<ChunkPoint>>,
    pub ensured_dimensions: Mutex<Vec<usize>>,
    pub deletes: AtomicUsize,
    pub searches: Mutex<Vec<usize>>,
    pub results: Vec<SearchResult>,
}

impl MemoryStore {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn write_count(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn collection_name(&self) -> &str {
        "memory"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        self.ensured_dimensions.lock().unwrap().push(dimension);
        Ok(())
    }

    async fn delete_collection(&self) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()> {
        self.points.lock().unwrap().extend(points);
        Ok(())
    }

    async fn search(&self, _query_vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>> {
        self.searches.lock().unwrap().push(limit);
        Ok(self.results.iter().take(limit).cloned().collect())
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        Ok(Some(CollectionInfo {
            points_count: self.write_count() as u64,
            indexed_vectors_count: 0,
            status: "Green".to_string(),
        }))
    }
}

/// Echoes the prompt it was given, or a canned reply
#[derive(Default)]
pub struct EchoChat {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl EchoChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for EchoChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone().unwrap_or_else(|| prompt.to_string()))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

#[async_trait]
impl<T: Embedder> Embedder for Arc<T> {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        self.as_ref().embed_documents(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.as_ref().embed_query(text).await
    }

    fn model_name(&self) -> &str {
        self.as_ref().model_name()
    }
}

#[async_trait]
impl<T: VectorStore> VectorStore for Arc<T> {
    fn collection_name(&self) -> &str {
        self.as_ref().collection_name()
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        self.as_ref().ensure_collection(dimension).await
    }

    async fn delete_collection(&self) -> Result<bool> {
        self.as_ref().delete_collection().await
    }

    async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()> {
        self.as_ref().upsert_points(points).await
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>> {
        self.as_ref().search(query_vector, limit).await
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        self.as_ref().collection_info().await
    }
}

#[async_trait]
impl<T: ChatModel> ChatModel for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.as_ref().complete(prompt).await
    }

    fn model_name(&self) -> &str {
        self.as_ref().model_name()
    }
}

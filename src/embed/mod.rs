//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - The Gemini embedding client
//! - Batch processing for efficiency

mod gemini;

pub use gemini::*;

use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use indicatif::ProgressBar;

/// A dense vector produced for a chunk or a query
pub type Embedding = Vec<f32>;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts for storage
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>>;

    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &GoogleConfig) -> Result<Box<dyn Embedder>> {
    let embedder = GeminiEmbedder::from_config(config)?;
    Ok(Box::new(embedder))
}

/// Helper to embed in batches with progress
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Embedding>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let batch_texts: Vec<String> = chunk.to_vec();
        let embeddings = embedder.embed_documents(batch_texts).await?;
        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunk.len(),
                embeddings.len()
            )));
        }
        all_embeddings.extend(embeddings);

        if let Some(pb) = progress {
            pb.inc(chunk.len() as u64);
        }
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingEmbedder {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Embedding> {
            Ok(vec![text.len() as f32])
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let embedder = RecordingEmbedder {
            batches: Mutex::new(Vec::new()),
        };
        let texts: Vec<String> = (0..10).map(|i| "x".repeat(i + 1)).collect();

        let embeddings = embed_in_batches(&embedder, texts, 3, None).await.unwrap();

        assert_eq!(*embedder.batches.lock().unwrap(), vec![3, 3, 3, 1]);
        let firsts: Vec<f32> = embeddings.iter().map(|e| e[0]).collect();
        assert_eq!(firsts, (1..=10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_embed_in_batches_empty_input() {
        let embedder = RecordingEmbedder {
            batches: Mutex::new(Vec::new()),
        };
        let embeddings = embed_in_batches(&embedder, Vec::new(), 100, None)
            .await
            .unwrap();
        assert!(embeddings.is_empty());
        assert!(embedder.batches.lock().unwrap().is_empty());
    }
}

//! Ingest command implementation
//!
//! load → split → enrich → assign ids → embed → store

use crate::chunk::{enrich_chunks, generate_chunk_ids, TextSplitter};
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::parse::DocumentLoader;
use crate::progress::{finish_progress, start_progress_bar};
use crate::store::{ChunkPoint, VectorStore};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Points per upsert request
const UPSERT_BATCH_SIZE: usize = 256;

/// Ingest options
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// PDF to ingest instead of the configured one
    pub pdf_path: Option<PathBuf>,
    /// Delete the collection before writing
    pub reset: bool,
}

/// Statistics from an ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub pdf_path: String,
    pub collection: String,
    pub pages_loaded: usize,
    pub chunks_created: usize,
    pub collection_reset: bool,
}

/// Ingest a PDF into the vector store
pub async fn cmd_ingest(
    config: &Config,
    loader: &dyn DocumentLoader,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    options: IngestOptions,
) -> Result<IngestStats> {
    let pdf_path = options
        .pdf_path
        .unwrap_or_else(|| config.pdf_path.clone());

    if !pdf_path.is_file() {
        return Err(Error::PdfNotFound(pdf_path));
    }

    info!("Starting ingestion of {}", pdf_path.display());
    let documents = loader.load(&pdf_path).await?;
    info!("Loaded {} pages", documents.len());

    let splitter = TextSplitter::new(&config.chunk);
    let chunks = enrich_chunks(splitter.split_documents(&documents));
    info!("Split document into {} chunks", chunks.len());

    let mut stats = IngestStats {
        pdf_path: pdf_path.display().to_string(),
        collection: store.collection_name().to_string(),
        pages_loaded: documents.len(),
        chunks_created: 0,
        collection_reset: false,
    };

    if chunks.is_empty() {
        warn!(
            "No text could be extracted from {}; nothing to store",
            pdf_path.display()
        );
        return Ok(stats);
    }

    let ids = generate_chunk_ids(chunks.len());
    let texts: Vec<String> = chunks.iter().map(|c| c.page_content.clone()).collect();

    info!("Embedding chunks with {}", embedder.model_name());
    let progress = start_progress_bar(texts.len(), "Embedding chunks");
    let embedded = embed_in_batches(
        embedder,
        texts,
        config.google.embedding_batch_size,
        progress.as_ref(),
    )
    .await;
    finish_progress(progress, "Chunks embedded");
    let embeddings = embedded?;

    let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
    if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
        return Err(Error::Embedding(format!(
            "Embedding model '{}' returned inconsistent vector sizes",
            embedder.model_name()
        )));
    }

    info!(
        "Inserting vectors into collection '{}'",
        store.collection_name()
    );

    if options.reset {
        stats.collection_reset = store.delete_collection().await?;
    }
    store.ensure_collection(dimension).await?;

    let ingested_at = Utc::now().to_rfc3339();
    let points: Vec<ChunkPoint> = ids
        .into_iter()
        .zip(chunks)
        .zip(embeddings)
        .map(|((id, chunk), vector)| ChunkPoint::new(id, chunk, vector, ingested_at.clone()))
        .collect();

    let total = points.len();
    for batch in points.chunks(UPSERT_BATCH_SIZE) {
        debug!("Upserting batch of {} points", batch.len());
        store.upsert_points(batch.to_vec()).await?;
    }

    stats.chunks_created = total;
    info!(
        "Ingestion complete: {} chunks stored in '{}'",
        total, stats.collection
    );

    Ok(stats)
}

/// Print ingestion results to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("Ingestão concluída com sucesso!");
    println!("  Arquivo: {}", stats.pdf_path);
    println!("  Coleção: {}", stats.collection);
    println!("  Páginas carregadas: {}", stats.pages_loaded);
    println!("  Chunks vetorizados e armazenados: {}", stats.chunks_created);
    if stats.collection_reset {
        println!("  Coleção anterior removida antes da inserção");
    }
}

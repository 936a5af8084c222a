//! Text chunking
//!
//! This module handles:
//! - Splitting page documents into bounded, overlapping chunks, trying
//!   paragraph, line, word and finally character boundaries in that order
//! - Dropping empty metadata fields from chunks
//! - Assigning sequential chunk ids
//! - Computing content hashes

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::parse::Document;
use blake3::Hasher;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use tracing::warn;

/// A text chunk with the metadata of the page it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The actual text content
    pub page_content: String,

    /// Metadata inherited from the source document
    pub metadata: Map<String, Value>,
}

/// Recursive character splitter
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(config: &ChunkConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split a single text into chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, copying its metadata onto each chunk
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(move |text| Chunk {
                        page_content: text,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();
        if separators.is_empty() {
            final_chunks.extend(join_pieces(&[text]));
            return final_chunks;
        }

        let idx = select_separator(text, separators);
        let separator = &separators[idx];
        let remaining = &separators[idx + 1..];

        let mut good: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good.push(piece);
                continue;
            }

            if !good.is_empty() {
                final_chunks.extend(self.merge_pieces(&good));
                good.clear();
            }

            if remaining.is_empty() {
                final_chunks.extend(join_pieces(&[piece]));
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good.is_empty() {
            final_chunks.extend(self.merge_pieces(&good));
        }

        final_chunks
    }

    /// Greedily pack pieces into chunks, carrying up to `chunk_overlap`
    /// trailing characters into the next chunk
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                let joined: Vec<&str> = current.iter().map(|(p, _)| *p).collect();
                chunks.extend(join_pieces(&joined));

                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        let joined: Vec<&str> = current.iter().map(|(p, _)| *p).collect();
        chunks.extend(join_pieces(&joined));
        chunks
    }
}

fn join_pieces(pieces: &[&str]) -> Option<String> {
    let joined = pieces.concat();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Drop metadata entries whose value is an empty string or null
pub fn enrich_chunk(chunk: Chunk) -> Chunk {
    let metadata = chunk
        .metadata
        .into_iter()
        .filter(|(_, value)| !is_empty_value(value))
        .collect();

    Chunk {
        page_content: chunk.page_content,
        metadata,
    }
}

/// Enrich every chunk
pub fn enrich_chunks(chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks.into_iter().map(enrich_chunk).collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Sequential chunk ids: `doc-0`, `doc-1`, ...
pub fn generate_chunk_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("doc-{}", i)).collect()
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    compute_content_hash(text.as_bytes())
}

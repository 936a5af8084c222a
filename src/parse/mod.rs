//! Document loading
//!
//! Loaders turn a file into one [`Document`] per logical page. Text
//! extraction itself is delegated to external libraries.

mod pdf;

pub use pdf::*;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;

/// A loaded page of text with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Extracted page text
    pub page_content: String,

    /// Loader-provided metadata (source path, page number, ...)
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }
}

/// Trait for document loaders
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load a file into page documents
    async fn load(&self, path: &Path) -> Result<Vec<Document>>;
}

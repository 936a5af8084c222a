//! PDF loading via `pdf-extract`, with document info read through `lopdf`

use super::{Document, DocumentLoader};
use crate::error::{Error, Result};
use async_trait::async_trait;
use lopdf::Object;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loads a PDF as one document per page
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let owned: PathBuf = path.to_path_buf();

        // pdf-extract is synchronous, so we wrap in blocking task
        let (pages, info) = tokio::task::spawn_blocking(move || {
            let pages = pdf_extract::extract_text_by_pages(&owned)
                .map_err(|e| Error::Parse(format!("Failed to extract text from PDF: {}", e)))?;
            let info = read_document_info(&owned).unwrap_or_else(|e| {
                warn!("Could not read document info of {}: {}", owned.display(), e);
                Map::new()
            });
            Ok::<_, Error>((pages, info))
        })
        .await
        .map_err(|e| Error::Parse(format!("Task join error: {}", e)))??;

        debug!(
            "Extracted {} pages and {} info entries from {}",
            pages.len(),
            info.len(),
            path.display()
        );

        let source = path.display().to_string();
        Ok(pages_to_documents(&source, pages, &info))
    }
}

/// Read the trailer `/Info` dictionary with lowercased keys.
///
/// Empty strings and nulls are kept as they are.
pub fn read_document_info(path: &Path) -> Result<Map<String, Value>> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| Error::Parse(format!("Failed to open PDF: {}", e)))?;

    let mut info = Map::new();
    let Ok(entry) = doc.trailer.get(b"Info") else {
        return Ok(info);
    };
    let dict = doc
        .dereference(entry)
        .and_then(|(_, object)| object.as_dict())
        .map_err(|e| Error::Parse(format!("Invalid /Info dictionary: {}", e)))?;

    for (key, value) in dict.iter() {
        let value = match value {
            Object::Reference(_) => doc.dereference(value).map(|(_, v)| v).unwrap_or(value),
            _ => value,
        };
        if let Some(value) = info_value(value) {
            info.insert(String::from_utf8_lossy(key).to_lowercase(), value);
        }
    }

    Ok(info)
}

fn info_value(object: &Object) -> Option<Value> {
    match object {
        Object::Null => Some(Value::Null),
        Object::String(bytes, _) => Some(Value::String(decode_text_string(bytes))),
        Object::Name(name) => Some(Value::String(String::from_utf8_lossy(name).into_owned())),
        Object::Integer(i) => Some(Value::String(i.to_string())),
        Object::Real(r) => Some(Value::String(r.to_string())),
        Object::Boolean(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a byte-order mark, or a single-byte encoding
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        },
    }
}

/// Attach the document info and per-page metadata to extracted page texts
pub fn pages_to_documents(
    source: &str,
    pages: Vec<String>,
    info: &Map<String, Value>,
) -> Vec<Document> {
    let total_pages = pages.len();

    pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| {
            let mut metadata = info.clone();
            metadata.insert("source".to_string(), Value::String(source.to_string()));
            metadata.insert("page".to_string(), Value::from(page));
            metadata.insert("total_pages".to_string(), Value::from(total_pages));
            metadata.insert(
                "page_label".to_string(),
                Value::String((page + 1).to_string()),
            );
            Document::new(text, metadata)
        })
        .collect()
}

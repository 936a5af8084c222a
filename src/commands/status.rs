//! Status command implementation

use crate::config::Config;
use crate::store::VectorStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: Option<String>,
    pub database_url: String,
    pub collection_name: String,
    pub pdf_path: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub api_key_set: bool,
    pub database_connected: bool,
    pub collection_exists: bool,
    pub points_count: u64,
    pub collection_status: Option<String>,
}

/// Get system status
pub async fn cmd_status(config: &Config, store: &dyn VectorStore) -> StatusInfo {
    info!("Getting status");

    let (database_connected, info) = match store.collection_info().await {
        Ok(info) => (true, info),
        Err(e) => {
            debug!("Vector store connection error: {:?}", e);
            (false, None)
        }
    };

    StatusInfo {
        config_path: config.source.as_ref().map(|p| p.display().to_string()),
        database_url: config.database_url.clone(),
        collection_name: store.collection_name().to_string(),
        pdf_path: config.pdf_path.display().to_string(),
        embedding_model: config.google.embedding_model.clone(),
        chat_model: config.google.chat_model.clone(),
        api_key_set: config.google.api_key().is_some(),
        database_connected,
        collection_exists: info.is_some(),
        points_count: info.as_ref().map(|i| i.points_count).unwrap_or(0),
        collection_status: info.map(|i| i.status),
    }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 pdfchat Status\n");
    println!(
        "Configuration: {}",
        status.config_path.as_deref().unwrap_or("(environment)")
    );
    println!("PDF: {}", status.pdf_path);
    println!("\nVector database:");
    println!("  URL: {}", status.database_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.database_connected {
        if status.collection_exists {
            "✓ Connected"
        } else {
            "⚠ Connected (collection not created - run 'pdfchat ingest' to create)"
        }
    } else {
        "✗ Not connected"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.points_count);
    if let Some(collection_status) = &status.collection_status {
        println!("  Collection status: {}", collection_status);
    }

    println!("\nModels:");
    println!("  Embedding: {}", status.embedding_model);
    println!("  Chat: {}", status.chat_model);
    println!(
        "  API key: {}",
        if status.api_key_set { "✓ set" } else { "✗ missing" }
    );
}

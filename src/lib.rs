//! pdfchat - A CLI chat tool for asking questions about a PDF
//!
//! This crate provides:
//! - PDF ingestion into a Qdrant collection (load, split, enrich, embed, upsert)
//! - Retrieval-augmented answers backed by the Google Generative Language API
//! - An interactive terminal chat loop

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod google_api;
pub mod llm;
pub mod parse;
pub mod progress;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};

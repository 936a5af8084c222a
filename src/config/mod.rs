//! Configuration management for pdfchat
//!
//! Settings come from an optional TOML file; any field the file leaves out
//! falls back to its environment variable and then to a built-in default.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Generative Language API settings
    #[serde(default)]
    pub google: GoogleConfig,

    /// PDF file ingested by `pdfchat ingest`
    #[serde(default = "default_pdf_path")]
    pub pdf_path: PathBuf,

    /// Vector collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Vector database (Qdrant) connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Environment variable name for the vector database API key
    #[serde(default = "default_database_api_key_env")]
    pub database_api_key_env: String,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Where this configuration was loaded from, if anywhere
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Google Generative Language API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Embedding model (e.g. `models/text-embedding-004`)
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Chat model (e.g. `gemini-2.0-flash`)
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Retries for transport errors, 429 and 5xx responses
    #[serde(default = "default_request_retries")]
    pub request_retries: usize,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of similar chunks retrieved as context
    #[serde(default = "default_search_k")]
    pub k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google: GoogleConfig::default(),
            pdf_path: default_pdf_path(),
            collection_name: default_collection_name(),
            database_url: default_database_url(),
            database_api_key_env: default_database_api_key_env(),
            chunk: ChunkConfig::default(),
            search: SearchConfig::default(),
            source: None,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base_url: default_api_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            embedding_batch_size: default_embedding_batch_size(),
            timeout_secs: default_request_timeout(),
            request_retries: default_request_retries(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: default_search_k(),
        }
    }
}

impl GoogleConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Like [`GoogleConfig::api_key`], but missing keys are a configuration error
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            Error::Config(format!(
                "environment variable {} is not set",
                self.api_key_env
            ))
        })
    }
}

impl Config {
    /// Get the default base directory for pdfchat (~/.pdfchat)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pdfchat")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Build configuration from environment variables and defaults only
    pub fn from_env() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(config_path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration for the CLI.
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present, otherwise the environment alone.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = Self::default_config_path();
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            debug!("No config file found, using environment");
            Self::from_env()
        }
    }

    /// Get the vector database API key from environment
    pub fn database_api_key(&self) -> Option<String> {
        std::env::var(&self.database_api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_size == 0 {
            return Err(Error::Config("chunk.chunk_size must be positive".to_string()));
        }

        if self.chunk.chunk_overlap >= self.chunk.chunk_size {
            return Err(Error::Config(
                "chunk.chunk_overlap must be < chunk.chunk_size".to_string(),
            ));
        }

        if self.search.k == 0 {
            return Err(Error::Config("search.k must be positive".to_string()));
        }

        if self.google.embedding_batch_size == 0 || self.google.embedding_batch_size > 100 {
            return Err(Error::Config(
                "google.embedding_batch_size must be between 1 and 100".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.google.temperature) {
            return Err(Error::Config(
                "google.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.collection_name.trim().is_empty() {
            return Err(Error::Config("collection_name must not be empty".to_string()));
        }

        if self.google.embedding_model.trim().is_empty() || self.google.chat_model.trim().is_empty()
        {
            return Err(Error::Config("model names must not be empty".to_string()));
        }

        url::Url::parse(&self.google.api_base_url)
            .map_err(|e| Error::Config(format!("invalid google.api_base_url: {}", e)))?;
        url::Url::parse(&self.database_url)
            .map_err(|e| Error::Config(format!("invalid database_url: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_chunking_matches_ingestion_settings() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 150);
        assert_eq!(SearchConfig::default().k, 10);
        assert_eq!(default_temperature(), 0.0);
    }

    #[test]
    fn test_toml_overrides_fields() {
        let config = Config::from_toml_str(
            r#"
            pdf_path = "/tmp/manual.pdf"
            collection_name = "manual"
            database_url = "http://qdrant:6334"

            [google]
            embedding_model = "models/embedding-001"
            chat_model = "gemini-1.5-flash"
            api_base_url = "http://localhost:9999"

            [chunk]
            chunk_size = 400
            chunk_overlap = 40

            [search]
            k = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.pdf_path, PathBuf::from("/tmp/manual.pdf"));
        assert_eq!(config.collection_name, "manual");
        assert_eq!(config.database_url, "http://qdrant:6334");
        assert_eq!(config.google.embedding_model, "models/embedding-001");
        assert_eq!(config.google.chat_model, "gemini-1.5-flash");
        assert_eq!(config.chunk.chunk_size, 400);
        assert_eq!(config.chunk.chunk_overlap, 40);
        assert_eq!(config.search.k, 3);
        assert_eq!(config.google.api_key_env, "GOOGLE_API_KEY");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::from_toml_str(
            r#"
            database_url = "http://127.0.0.1:6334"
            [google]
            api_base_url = "http://127.0.0.1:9999"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        // Invalid: overlap >= size
        config.chunk.chunk_overlap = config.chunk.chunk_size;
        assert!(config.validate().is_err());

        config.chunk.chunk_overlap = 100;
        assert!(config.validate().is_ok());

        config.search.k = 0;
        assert!(config.validate().is_err());
        config.search.k = 10;

        config.google.embedding_batch_size = 101;
        assert!(config.validate().is_err());
        config.google.embedding_batch_size = 100;

        config.database_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_records_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "collection_name = \"from_file\"").unwrap();
        writeln!(file, "database_url = \"http://127.0.0.1:6334\"").unwrap();
        writeln!(file, "[google]").unwrap();
        writeln!(file, "api_base_url = \"http://127.0.0.1:9999\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.collection_name, "from_file");
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_require_api_key_reports_variable_name() {
        let google = GoogleConfig {
            api_key_env: "PDFCHAT_TEST_UNSET_API_KEY".to_string(),
            ..GoogleConfig::default()
        };
        let err = google.require_api_key().unwrap_err();
        assert!(err.to_string().contains("PDFCHAT_TEST_UNSET_API_KEY"));
    }
}

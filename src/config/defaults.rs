//! Default values for configuration
//!
//! Values that correspond to a documented environment variable read it first.

/// Default environment variable holding the Google API key
pub fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

/// Default Generative Language API base URL
pub fn default_api_base_url() -> String {
    std::env::var("GOOGLE_API_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    std::env::var("GOOGLE_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "models/text-embedding-004".to_string())
}

/// Default chat model
pub fn default_chat_model() -> String {
    std::env::var("GOOGLE_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string())
}

/// Answers must stay grounded in the retrieved context
pub fn default_temperature() -> f32 {
    0.0
}

/// Texts per batchEmbedContents request (API limit is 100)
pub fn default_embedding_batch_size() -> usize {
    100
}

/// Default request timeout in seconds
pub fn default_request_timeout() -> u64 {
    60
}

/// Default number of retries for transient API failures
pub fn default_request_retries() -> usize {
    2
}

/// Default PDF to ingest
pub fn default_pdf_path() -> std::path::PathBuf {
    std::env::var("PDF_PATH")
        .unwrap_or_else(|_| "document.pdf".to_string())
        .into()
}

/// Default collection name
pub fn default_collection_name() -> String {
    std::env::var("COLLECTION_NAME").unwrap_or_else(|_| "pdf_chunks".to_string())
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for the vector database API key
pub fn default_database_api_key_env() -> String {
    "DATABASE_API_KEY".to_string()
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    150
}

/// Default number of similar chunks used as context
pub fn default_search_k() -> usize {
    10
}

use super::{Embedder, Embedding};
use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use crate::google_api::{model_resource, ApiKind, GoogleApiClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const TASK_RETRIEVAL_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_RETRIEVAL_QUERY: &str = "RETRIEVAL_QUERY";

#[derive(Debug, Clone, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

/// Embeddings from the Gemini `batchEmbedContents` endpoint
pub struct GeminiEmbedder {
    client: GoogleApiClient,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: GoogleApiClient, model: &str) -> Self {
        Self {
            client,
            model: model_resource(model),
        }
    }

    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let client = GoogleApiClient::from_config(config)?;
        Ok(Self::new(client, &config.embedding_model))
    }

    async fn batch_embed(&self, texts: Vec<String>, task_type: &'static str) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        debug!("Embedding {} texts as {}", expected, task_type);

        let request = BatchEmbedRequest {
            requests: texts
                .into_iter()
                .map(|text| EmbedContentRequest {
                    model: self.model.clone(),
                    content: Content {
                        parts: vec![Part { text }],
                    },
                    task_type,
                })
                .collect(),
        };

        let url = self.client.model_endpoint(&self.model, "batchEmbedContents")?;
        let response: BatchEmbedResponse = self
            .client
            .post_json(ApiKind::Embedding, url, &request)
            .await?;

        if response.embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "Model '{}' returned {} embeddings for {} inputs",
                self.model,
                response.embeddings.len(),
                expected
            )));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        self.batch_embed(texts, TASK_RETRIEVAL_DOCUMENT).await
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.batch_embed(vec![text.to_string()], TASK_RETRIEVAL_QUERY)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder_for(server: &MockServer) -> GeminiEmbedder {
        let config = GoogleConfig {
            api_base_url: server.uri(),
            request_retries: 0,
            ..GoogleConfig::default()
        };
        let client = GoogleApiClient::new(&config, "test-key".to_string()).unwrap();
        GeminiEmbedder::new(client, "text-embedding-004")
    }

    #[tokio::test]
    async fn test_embed_documents_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-embedding-004:batchEmbedContents"))
            .and(body_partial_json(json!({
                "requests": [
                    {
                        "model": "models/text-embedding-004",
                        "content": {"parts": [{"text": "first"}]},
                        "taskType": "RETRIEVAL_DOCUMENT"
                    },
                    {
                        "model": "models/text-embedding-004",
                        "content": {"parts": [{"text": "second"}]},
                        "taskType": "RETRIEVAL_DOCUMENT"
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = embedder_for(&server);
        let embeddings = embedder
            .embed_documents(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
        assert_eq!(embedder.model_name(), "models/text-embedding-004");
    }

    #[tokio::test]
    async fn test_embed_query_uses_query_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-embedding-004:batchEmbedContents"))
            .and(body_partial_json(json!({
                "requests": [{"taskType": "RETRIEVAL_QUERY"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [{"values": [1.0, 0.0, 0.0]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedding = embedder_for(&server).embed_query("question").await.unwrap();
        assert_eq!(embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": []})))
            .mount(&server)
            .await;

        let err = embedder_for(&server)
            .embed_documents(vec!["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}

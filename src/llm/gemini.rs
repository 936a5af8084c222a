use super::ChatModel;
use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use crate::google_api::{model_resource, ApiKind, GoogleApiClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self, model: &str) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(Error::Llm(format!(
                "Model '{}' returned no answer ({})",
                model, reason
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Llm(format!(
                "Model '{}' returned an empty answer (finish reason: {})",
                model,
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

/// Chat completion via the Gemini `generateContent` endpoint
pub struct GeminiChat {
    client: GoogleApiClient,
    model: String,
    temperature: f32,
}

impl GeminiChat {
    pub fn new(client: GoogleApiClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model_resource(model),
            temperature,
        }
    }

    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let client = GoogleApiClient::from_config(config)?;
        Ok(Self::new(client, &config.chat_model, config.temperature))
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Sending {} prompt characters to {}", prompt.len(), self.model);

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let url = self.client.model_endpoint(&self.model, "generateContent")?;
        let response: GenerateContentResponse =
            self.client.post_json(ApiKind::Chat, url, &request).await?;

        response.into_text(&self.model)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

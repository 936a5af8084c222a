//! HTTP client for the Google Generative Language API
//!
//! Shared by the embedding and chat clients: endpoint construction, API key
//! header, timeouts and retry of transient failures.

use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Which client a failure is reported as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Embedding,
    Chat,
}

impl ApiKind {
    fn error(self, message: String) -> Error {
        match self {
            ApiKind::Embedding => Error::Embedding(message),
            ApiKind::Chat => Error::Llm(message),
        }
    }
}

pub struct GoogleApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    retries: usize,
}

impl GoogleApiClient {
    pub fn new(config: &GoogleConfig, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            retries: config.request_retries,
        })
    }

    /// Build from config, reading the API key from the environment
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Self::new(config, api_key)
    }

    /// URL for `POST /v1beta/{model}:{method}`
    pub fn model_endpoint(&self, model: &str, method: &str) -> Result<Url> {
        let path = format!("/v1beta/{}:{}", model_resource(model), method);
        self.base_url
            .join(&path)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))
    }

    /// POST a JSON body and decode the JSON response, retrying transport
    /// failures, 429 and 5xx responses with linear back-off
    pub async fn post_json<B, T>(&self, kind: ApiKind, url: Url, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.retries {
            debug!("POST {} (attempt {})", url.path(), attempt + 1);

            let sent = self
                .client
                .post(url.clone())
                .header(API_KEY_HEADER, self.api_key.as_str())
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| kind.error(format!("Invalid response body: {}", e)));
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    let err = kind.error(format!("{} returned {}: {}", url.path(), status, text));
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => last_err = Some(kind.error(e.to_string())),
            }

            if attempt < self.retries {
                warn!("Request to {} failed, retrying", url.path());
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| kind.error("Request failed".to_string())))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Normalize a model name to its `models/...` resource name
pub fn model_resource(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

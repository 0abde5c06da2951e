//! HTTP client for the tokenizer and message inference endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ServiceError;

use super::types::{InferenceRequest, PerFileMessage, Route, TokenizeRequest, TokenizeResponse};

/// Default service address, used when no profile or override is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Remote tokenizer and message generator.
///
/// This abstraction allows mocking the service in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Split a line of code into model tokens.
    async fn tokenize(&self, code: &str) -> Result<Vec<String>, ServiceError>;

    /// Request a commit message for one file's tokens.
    async fn infer(
        &self,
        route: Route,
        request: &InferenceRequest,
    ) -> Result<PerFileMessage, ServiceError>;
}

/// Service reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpInferenceService {
    client: Client,
    base: Url,
}

impl HttpInferenceService {
    /// Create a client for the service rooted at `endpoint`.
    ///
    /// A missing trailing slash is added so endpoint paths are appended
    /// rather than replacing the last segment.
    pub fn new(endpoint: &str) -> Result<Self, ServiceError> {
        let invalid = |reason: String| ServiceError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason,
        };

        let mut base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|e| ServiceError::InvalidEndpoint {
                url: self.base.to_string(),
                reason: e.to_string(),
            })
    }

    /// POST a JSON body and decode a JSON response with required fields.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        let endpoint = url.to_string();
        let payload = serde_json::to_vec(body).map_err(ServiceError::Serialize)?;

        debug!("POST {} ({} bytes)", endpoint, payload.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await
            .map_err(|source| ServiceError::Unavailable {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::BadStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ServiceError::Unavailable {
                endpoint: endpoint.clone(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            let preview: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            ServiceError::MalformedResponse {
                endpoint,
                reason: format!("{}. Response: {}", e, preview),
            }
        })
    }
}

#[async_trait]
impl InferenceService for HttpInferenceService {
    async fn tokenize(&self, code: &str) -> Result<Vec<String>, ServiceError> {
        let response: TokenizeResponse = self
            .post_json("tokenizer", &TokenizeRequest { code })
            .await?;
        Ok(response.tokens)
    }

    async fn infer(
        &self,
        route: Route,
        request: &InferenceRequest,
    ) -> Result<PerFileMessage, ServiceError> {
        self.post_json(route.path(), request).await
    }
}

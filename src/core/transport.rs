//! Shaping provider requests and sending them over HTTP.

use crate::api::response::format_api_error;
use crate::api::{ChatMessage, ChatRequest, GeminiRequest, GenerationConfig};
use crate::core::builtin_providers::ApiFormat;
use crate::core::providers::ResolvedProvider;
use crate::utils::url::endpoint_for_model;
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Per-request overrides of the model/provider defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestSettings {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// A fully shaped request: where to send it, how to authenticate and what
/// body to post.
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Value,
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query_keys: Vec<&str> = self.query.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ProviderRequest")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("query_keys", &query_keys)
            .field("body", &self.body)
            .finish()
    }
}

impl ProviderRequest {
    pub fn build(
        resolved: &ResolvedProvider,
        messages: &[ChatMessage],
        settings: &RequestSettings,
    ) -> Result<Self, serde_json::Error> {
        let temperature = settings
            .temperature
            .unwrap_or(resolved.model.default_temperature);
        let max_tokens = settings
            .max_tokens
            .filter(|tokens| *tokens > 0)
            .unwrap_or(resolved.provider.default_max_tokens);
        let url = endpoint_for_model(&resolved.provider.endpoint, &resolved.model.id);
        let extra_fields = resolved.model.extra_fields.clone();

        let request = match resolved.provider.api_format {
            ApiFormat::Openai => ProviderRequest {
                url,
                bearer_token: Some(resolved.api_key.clone()),
                query: Vec::new(),
                body: serde_json::to_value(ChatRequest {
                    model: &resolved.model.id,
                    messages,
                    max_tokens,
                    temperature,
                    extra_fields,
                })?,
            },
            ApiFormat::GeminiNative => ProviderRequest {
                url,
                bearer_token: None,
                query: vec![("key".to_string(), resolved.api_key.clone())],
                body: serde_json::to_value(GeminiRequest::from_messages(
                    messages,
                    GenerationConfig {
                        temperature,
                        max_output_tokens: max_tokens,
                    },
                    extra_fields,
                ))?,
            },
        };

        debug!(
            url = %request.url,
            format = resolved.provider.api_format.as_str(),
            messages = messages.len(),
            max_tokens,
            temperature,
            "prepared provider request"
        );
        Ok(request)
    }
}

#[derive(Debug)]
pub enum TransportError {
    InvalidUrl { url: String, reason: String },
    /// Connection, timeout or other failure before a response arrived.
    Request(reqwest::Error),
    /// Non-success HTTP status; `body` is the raw response text.
    Status { status: u16, body: String },
    Decode(reqwest::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidUrl { url, reason } => {
                write!(f, "Invalid provider endpoint {url}: {reason}")
            }
            TransportError::Request(err) if err.is_timeout() => {
                write!(f, "Request timed out: {err}")
            }
            TransportError::Request(err) => write!(f, "Request failed: {err}"),
            TransportError::Status { status, body } => {
                write!(f, "HTTP {status}: {}", format_api_error(body))
            }
            TransportError::Decode(err) => write!(f, "Invalid response from provider: {err}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Request(err) | TransportError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

/// Sends one request and returns the decoded JSON response.
#[async_trait]
pub trait TransportClient: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> Result<Value, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self { client })
    }

    fn url_for(request: &ProviderRequest) -> Result<reqwest::Url, TransportError> {
        let mut url =
            reqwest::Url::parse(&request.url).map_err(|err| TransportError::InvalidUrl {
                url: request.url.clone(),
                reason: err.to_string(),
            })?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl TransportClient for ReqwestTransport {
    async fn send(&self, request: &ProviderRequest) -> Result<Value, TransportError> {
        let url = Self::url_for(request)?;
        let mut http_request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&request.body);

        if let Some(token) = &request.bearer_token {
            http_request = http_request.header("Authorization", format!("Bearer {token}"));
        }

        let response = http_request.send().await.map_err(TransportError::Request)?;
        let status = response.status();
        debug!(%status, "provider responded");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(TransportError::Decode)
    }
}

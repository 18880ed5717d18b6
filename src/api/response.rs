//! Reading provider responses: reply text, token usage, finish reasons and
//! error bodies. Both OpenAI-compatible and native Gemini shapes are handled.

use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexpectedResponse;

impl fmt::Display for UnexpectedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to extract content from response")
    }
}

impl Error for UnexpectedResponse {}

/// Reply text of a completed (non-streaming) request.
pub fn extract_response_content(response: &Value) -> Result<String, UnexpectedResponse> {
    if let Some(text) = response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    {
        return Ok(text.to_string());
    }

    if let Some(message) = response.pointer("/choices/0/message") {
        return match message.get("content") {
            Some(Value::String(text)) => Ok(text.clone()),
            // Some providers send `null` content alongside a refusal.
            Some(Value::Null) | None => Ok(String::new()),
            Some(_) => Err(UnexpectedResponse),
        };
    }

    Err(UnexpectedResponse)
}

/// Finish reason reported by the provider, if any.
pub fn finish_reason(response: &Value) -> Option<&str> {
    response
        .pointer("/candidates/0/finishReason")
        .or_else(|| response.pointer("/choices/0/finish_reason"))
        .and_then(Value::as_str)
}

/// Whether `reason` means the model stopped on its own.
pub fn is_natural_stop(reason: &str) -> bool {
    reason.eq_ignore_ascii_case("stop")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub sent: u64,
    pub received: u64,
    pub thinking: u64,
}

impl TokenUsage {
    pub fn from_response(response: &Value) -> Self {
        let count = |value: &Value, key: &str| value.get(key).and_then(Value::as_u64).unwrap_or(0);

        if let Some(meta) = response.get("usageMetadata") {
            let sent = count(meta, "promptTokenCount");
            let received = count(meta, "candidatesTokenCount");
            let total = count(meta, "totalTokenCount");
            return Self {
                sent,
                received,
                thinking: total.saturating_sub(sent + received),
            };
        }

        if let Some(usage) = response.get("usage") {
            return Self {
                sent: count(usage, "prompt_tokens"),
                received: count(usage, "completion_tokens"),
                thinking: 0,
            };
        }

        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sent == 0 && self.received == 0
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tokens: {} sent, {} received", self.sent, self.received)?;
        if self.thinking > 0 {
            write!(f, " (+ {} thinking)", self.thinking)?;
        }
        Ok(())
    }
}

/// One-line token summary, or `None` when the provider reported no usage.
pub fn token_usage_summary(response: &Value) -> Option<String> {
    let usage = TokenUsage::from_response(response);
    (!usage.is_empty()).then(|| usage.to_string())
}

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Turn a provider error body into a readable description.
///
/// JSON bodies are summarised from their `error.message` (or similar) field;
/// anything else is passed through trimmed.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API Error: {summary}");
            }
        }
        if let Ok(compact) = serde_json::to_string(&json_value) {
            return format!("API Error: {compact}");
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("API Error: {collapsed}")
}

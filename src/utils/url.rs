//! Endpoint URL helpers.

const MODEL_PLACEHOLDER: &str = "{{model}}";

/// Normalize an endpoint URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use rpchat::utils::url::normalize_endpoint;
///
/// assert_eq!(normalize_endpoint("https://api.example.com/v1/chat/"), "https://api.example.com/v1/chat");
/// assert_eq!(normalize_endpoint(" https://api.example.com// "), "https://api.example.com");
/// ```
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

/// Build the request URL for `model`, filling in a `{{model}}` placeholder
/// when the endpoint has one.
///
/// # Examples
///
/// ```
/// use rpchat::utils::url::endpoint_for_model;
///
/// assert_eq!(
///     endpoint_for_model("https://example.com/models/{{model}}:generateContent", "gemini-pro"),
///     "https://example.com/models/gemini-pro:generateContent"
/// );
/// assert_eq!(
///     endpoint_for_model("https://example.com/chat/completions/", "any"),
///     "https://example.com/chat/completions"
/// );
/// ```
pub fn endpoint_for_model(endpoint: &str, model: &str) -> String {
    normalize_endpoint(endpoint).replace(MODEL_PLACEHOLDER, model)
}

pub fn has_model_placeholder(endpoint: &str) -> bool {
    endpoint.contains(MODEL_PLACEHOLDER)
}

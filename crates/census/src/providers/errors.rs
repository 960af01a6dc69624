use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ProviderError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        let mut details = vec![];

        if let Some(status) = error.status() {
            details.push(format!("status: {}", status));
        }
        if error.is_timeout() {
            details.push("timeout".to_string());
        }
        if error.is_connect() {
            match error.url().and_then(|url| url.host_str().map(|h| (h, url.port()))) {
                Some((host, port)) => {
                    let port_info = port.map(|p| format!(":{}", p)).unwrap_or_default();
                    details.push(format!("failed to connect to {}{}", host, port_info));
                }
                None => details.push("connection failed".to_string()),
            }
        }

        if details.is_empty() {
            ProviderError::RequestFailed(error.to_string())
        } else {
            ProviderError::RequestFailed(format!("{} ({})", error, details.join(", ")))
        }
    }
}

fn check_context_length_exceeded(text: &str) -> bool {
    let check_phrases = [
        "too long",
        "context length",
        "context_length_exceeded",
        "reduce the length",
        "maximum context",
    ];
    let text_lower = text.to_lowercase();
    check_phrases
        .iter()
        .any(|phrase| text_lower.contains(phrase))
}

pub fn map_http_error_to_provider_error(
    status: StatusCode,
    payload: Option<Value>,
) -> ProviderError {
    let extract_message = || -> String {
        payload
            .as_ref()
            .and_then(|p| {
                p.get("error")
                    .and_then(|e| e.get("message"))
                    .or_else(|| p.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| payload.as_ref().map(|p| p.to_string()).unwrap_or_default())
    };

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(format!(
            "Authentication failed. Status: {}. Response: {}",
            status,
            extract_message()
        )),
        StatusCode::NOT_FOUND => {
            ProviderError::RequestFailed(format!("Resource not found (404): {}", extract_message()))
        }
        StatusCode::PAYLOAD_TOO_LARGE => ProviderError::ContextLengthExceeded(extract_message()),
        StatusCode::BAD_REQUEST => {
            let message = extract_message();
            if check_context_length_exceeded(&message) {
                ProviderError::ContextLengthExceeded(message)
            } else {
                ProviderError::RequestFailed(format!("Bad request (400): {}", message))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(extract_message()),
        _ if status.is_server_error() => {
            ProviderError::ServerError(format!("Server error ({}): {}", status, extract_message()))
        }
        _ => ProviderError::RequestFailed(format!(
            "Request failed with status {}: {}",
            status,
            extract_message()
        )),
    };

    tracing::warn!(
        "Provider request failed with status: {}. Payload: {:?}. Returning error: {:?}",
        status,
        payload,
        error
    );

    error
}

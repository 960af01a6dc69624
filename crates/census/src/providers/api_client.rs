use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use super::errors::{map_http_error_to_provider_error, ProviderError};

#[derive(Clone)]
pub enum AuthMethod {
    BearerToken(String),
    NoAuth,
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::BearerToken(_) => f.write_str("BearerToken([redacted])"),
            AuthMethod::NoAuth => f.write_str("NoAuth"),
        }
    }
}

/// Thin JSON-over-HTTP client bound to one host.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    host: Url,
    auth: AuthMethod,
}

impl ApiClient {
    pub fn new(host: &str, auth: AuthMethod) -> Result<Self, ProviderError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = if host.ends_with('/') {
            host.to_string()
        } else {
            format!("{}/", host)
        };
        let host = Url::parse(&normalized)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid host '{}': {}", host, e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, host, auth })
    }

    fn build_url(&self, path: &str) -> Result<Url, ProviderError> {
        self.host
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid path '{}': {}", path, e)))
    }

    pub async fn response_post(&self, path: &str, payload: &Value) -> Result<Response, ProviderError> {
        let url = self.build_url(path)?;
        let mut request = self.client.post(url).json(payload);
        if let AuthMethod::BearerToken(token) = &self.auth {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// POSTs `payload` and decodes the JSON body, mapping non-2xx statuses
    /// onto `ProviderError`.
    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, ProviderError> {
        let response = self.response_post(path, payload).await?;
        handle_response(response).await
    }
}

pub async fn handle_response(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let payload = serde_json::from_str::<Value>(&body).ok();
        return Err(map_http_error_to_provider_error(status, payload));
    }

    response.json::<Value>().await.map_err(|e| {
        ProviderError::InvalidResponse(format!("Response body is not valid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_join_under_host_prefix() {
        let client = ApiClient::new("http://localhost:8080/proxy", AuthMethod::NoAuth).unwrap();
        assert_eq!(
            client.build_url("/v1/responses").unwrap().as_str(),
            "http://localhost:8080/proxy/v1/responses"
        );
    }

    #[test]
    fn invalid_host_is_rejected() {
        assert!(ApiClient::new("not a url", AuthMethod::NoAuth).is_err());
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", AuthMethod::BearerToken("sk-live".to_string()));
        assert!(!rendered.contains("sk-live"));
    }
}

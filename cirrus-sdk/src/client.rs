//! Shared HTTP client for all product APIs
//!
//! Owns the `reqwest` client, injects the permanent-token auth header on
//! every request, retries server errors with a bounded backoff, and decodes
//! JSON responses. Product clients wrap this with their path layout.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Paginated list envelope used by most product APIs
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// Shared API client
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: trim_trailing_slash(base_url.into()),
            token: token.into(),
        })
    }

    /// Clone this client against a different base URL (per-product endpoint
    /// overrides), keeping the token and connection pool.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: trim_trailing_slash(base_url.into()),
            token: self.token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON entity
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None).await
    }

    /// POST a JSON body, decode a JSON response
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, Some(encode(body)?)).await
    }

    /// PATCH a JSON body, decode a JSON response
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, path, Some(encode(body)?)).await
    }

    /// PUT a JSON body, decode a JSON response
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> ApiResult<T> {
        self.request(Method::PUT, path, Some(encode(body)?)).await
    }

    /// DELETE, decode a JSON response (async products answer with task ids)
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, None).await
    }

    /// DELETE where the API answers with an empty body
    pub async fn delete_empty(&self, path: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, path, None).await.map(|_| ())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let text = self.execute(method, path, body).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            detail: e.to_string(),
        })
    }

    /// Send one request, retrying 5xx and transport errors with backoff.
    /// 4xx statuses are terminal and mapped to their typed errors.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err = None;

        for attempt in 0..RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                log::debug!("retrying {} {} (attempt {})", method, path, attempt + 1);
            }

            let mut req = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", format!("APIKey {}", self.token))
                .header("Accept", "application/json");
            if let Some(ref json) = body {
                req = req.json(json);
            }

            let response = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("{} {} transport error: {}", method, path, e);
                    last_err = Some(ApiError::Network(e.to_string()));
                    continue;
                }
            };

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log::debug!("{} {} -> {}", method, path, status);

            if status.is_success() {
                return Ok(text);
            }

            if status.is_server_error() {
                last_err = Some(ApiError::Http {
                    status: status.as_u16(),
                    method: method.to_string(),
                    path: path.to_string(),
                    message: error_message(&text),
                });
                continue;
            }

            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ApiError::Auth(error_message(&text))
                }
                _ => ApiError::Http {
                    status: status.as_u16(),
                    method: method.to_string(),
                    path: path.to_string(),
                    message: error_message(&text),
                },
            });
        }

        Err(last_err.unwrap_or_else(|| ApiError::Network("request failed".to_string())))
    }
}

fn encode(body: &impl serde::Serialize) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

/// Pull a human-readable message out of an error body, falling back to the
/// raw text. Product APIs answer with `{"message": "..."}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("https://api.cirrus.dev/", "token").unwrap();
        assert_eq!(client.base_url(), "https://api.cirrus.dev");
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"message":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message("plain text"), "plain text");
    }
}

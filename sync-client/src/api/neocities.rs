//! Neocities HTTP API client.
//!
//! Endpoints used:
//! - `GET  /list[?path=dir]` → `{"result":"success","files":[...]}`
//! - `POST /upload` multipart, one part per file named by its remote path
//! - `POST /delete` form body with repeated `filenames[]`
//!
//! Errors come back as `{"result":"error","error_type":..,"message":..}`,
//! usually alongside a 4xx status.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;

use super::{ApiError, RemoteApi, RemoteEntry};

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://neocities.org/api";

/// Longest excerpt of a non-JSON body kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Bearer credential for the Neocities API.
///
/// `Debug` never prints the key.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Returns `None` for an empty or blank string.
    pub fn new(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([{} chars REDACTED])", self.0.len())
    }
}

/// Common envelope of every Neocities response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    files: Vec<RemoteEntry>,
}

/// Client for the Neocities HTTP API.
pub struct NeocitiesApi {
    base_url: String,
    key: ApiKey,
    http: reqwest::Client,
}

impl NeocitiesApi {
    /// Create a client against the production API.
    pub fn new(key: ApiKey) -> Self {
        Self::with_base_url(key, DEFAULT_API_URL)
    }

    /// Create a client against another base URL.
    pub fn with_base_url(key: ApiKey, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            http: reqwest::Client::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL for an endpoint.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_response(status, &body)
    }
}

impl fmt::Debug for NeocitiesApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeocitiesApi")
            .field("base_url", &self.base_url)
            .field("key", &self.key)
            .finish()
    }
}

#[async_trait]
impl RemoteApi for NeocitiesApi {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteEntry>, ApiError> {
        let mut request = self
            .http
            .get(self.endpoint("list"))
            .bearer_auth(self.key.expose());
        if let Some(prefix) = prefix {
            request = request.query(&[("path", prefix.trim_end_matches('/'))]);
        }
        let response = Self::read(request.send().await?).await?;
        Ok(response.files)
    }

    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        let file_name = remote_path
            .rsplit('/')
            .next()
            .unwrap_or(remote_path)
            .to_string();
        let form = Form::new().part(
            remote_path.to_string(),
            Part::bytes(bytes).file_name(file_name),
        );
        let response = self
            .http
            .post(self.endpoint("upload"))
            .bearer_auth(self.key.expose())
            .multipart(form)
            .send()
            .await?;
        Self::read(response).await?;
        Ok(())
    }

    async fn delete(&self, remote_paths: &[String]) -> Result<(), ApiError> {
        let fields: Vec<(&str, &str)> = remote_paths
            .iter()
            .map(|p| ("filenames[]", p.as_str()))
            .collect();
        let response = self
            .http
            .post(self.endpoint("delete"))
            .bearer_auth(self.key.expose())
            .form(&fields)
            .send()
            .await?;
        Self::read(response).await?;
        Ok(())
    }
}

/// Interpret a status code and body.
///
/// Success needs both a 2xx status and `result == "success"`.
fn parse_response(status: u16, body: &str) -> Result<ApiResponse, ApiError> {
    let ok_status = (200..300).contains(&status);
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(response) if ok_status && response.result == "success" => Ok(response),
        Ok(response) if ok_status => Err(ApiError::Rejected {
            error_type: response.error_type.unwrap_or(response.result),
            message: response.message.unwrap_or_default(),
        }),
        Ok(response) => Err(ApiError::Status {
            status,
            message: match (response.error_type, response.message) {
                (Some(kind), Some(msg)) => format!("{}: {}", kind, msg),
                (None, Some(msg)) => msg,
                (Some(kind), None) => kind,
                (None, None) => response.result,
            },
        }),
        Err(_) if !ok_status => Err(ApiError::Status {
            status,
            message: excerpt(body),
        }),
        Err(e) => Err(ApiError::InvalidResponse(e.to_string())),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token_store::TokenStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Vendor fields minus id and timestamps, for `POST /vendors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVendor {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub is_active: bool,
}

/// One remote search hit. Linked to a vendor by name only — there is no id
/// back-reference, so a hit can outlive a rename of the vendor it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub vendor_name: String,
    pub category: String,
    pub description: String,
    /// Relevance, higher is better. No bound is enforced client-side.
    pub score: f64,
    #[serde(default)]
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Dispatches typed requests against the vendor backend.
///
/// Every request goes out with `Content-Type: application/json`; when the
/// token store holds a bearer token the `Authorization` header is built from
/// the live value at request time. Outcomes are classified into the
/// [`ApiError`] taxonomy — the dispatcher never retries and never recovers
/// errors itself.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, tokens, None)
    }

    /// Build a client with an optional request timeout. The base address is
    /// the only thing validated at construction; a bad one is fatal here so
    /// it can never surface later as a misclassified request failure.
    pub fn with_timeout(
        base_url: &str,
        tokens: TokenStore,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL must not be empty".to_string()));
        }
        reqwest::Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.to_string(),
            client,
            tokens,
        })
    }

    pub fn from_config(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(
            &config.server.base_url,
            tokens,
            config.server.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Dispatch a request and classify the outcome. A transport failure is
    /// `Network`, a non-2xx status is `Api` with the body kept raw, and a
    /// 2xx body that is not valid JSON is `Parse`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let (status, text) = self.execute(method, path, body.as_ref()).await?;
        decode(status, &text)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_as("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.post_as("/auth/register", request).await
    }

    pub async fn get_vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        let (status, text) = self.execute(Method::GET, "/vendors", None).await?;
        decode(status, &text)
    }

    pub async fn create_vendor(&self, vendor: &NewVendor) -> Result<Vendor, ApiError> {
        self.post_as("/vendors", vendor).await
    }

    pub async fn search_vendors(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, ApiError> {
        self.post_as("/search/vendors", request).await
    }

    /// Arbitrary diagnostic JSON from the backend.
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.send(Method::GET, "/health", None).await
    }

    async fn post_as<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("failed to encode request body: {}", e)))?;
        let (status, text) = self.execute(Method::POST, path, Some(&body)).await?;
        decode(status, &text)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(u16, String), ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");

        // Read the live token on every request; a store update between two
        // calls is observed immediately.
        if let Some(token) = self.tokens.current() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Network {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            warn!(target: "api", "{} rejected with status {}", path, status);
            return Err(ApiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(target: "api", "{} -> {}", path, status);
        Ok((status.as_u16(), text))
    }
}

fn decode<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse {
        status,
        message: e.to_string(),
    })
}

//! Account service HTTP client
//!
//! Thin reqwest client for the remote account service. Failed requests are
//! reported once; nothing is retried automatically.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, Response as ReqwestResponse, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::types::{
    ErrorBody, LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdateUserRequest,
};

/// Account API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the error body
        message: String,
    },

    /// The request never got an answer
    #[error("Network error: {0}")]
    Network(String),

    /// The answer was not the expected JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failure, if the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Whether the addressed user does not exist
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Result type for account API calls
pub type Result<T> = std::result::Result<T, ApiError>;

/// Configuration for the account client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base service URL (e.g., "http://localhost:3001")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Sapa-UMKM/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Operations of the remote account service
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// `POST /api/register`
    async fn register(&self, request: &RegisterRequest) -> Result<PublicUser>;

    /// `POST /api/login`
    async fn login(&self, request: &LoginRequest) -> Result<PublicUser>;

    /// `GET /api/users`
    async fn list_users(&self) -> Result<Vec<PublicUser>>;

    /// `GET /api/users/:id`
    async fn get_user(&self, id: &str) -> Result<PublicUser>;

    /// `PUT /api/users/:id`
    async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<PublicUser>;

    /// `DELETE /api/users/:id`
    async fn delete_user(&self, id: &str) -> Result<MessageResponse>;
}

/// reqwest-backed [`AccountApi`]
#[derive(Debug, Clone)]
pub struct AccountClient {
    client: ReqwestClient,
    config: ClientConfig,
}

impl AccountClient {
    /// Create a new account client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "account request failed");
            ApiError::Network(e.to_string())
        })?;

        parse_response(response).await
    }
}

/// Turn a reqwest response into data or an [`ApiError`]
async fn parse_response<T>(response: ReqwestResponse) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|error| error.message)
            .unwrap_or(body);
        tracing::debug!(status = status.as_u16(), %message, "account service rejected request");
        return Err(ApiError::Status { status: status.as_u16(), message });
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
}

#[async_trait]
impl AccountApi for AccountClient {
    async fn register(&self, request: &RegisterRequest) -> Result<PublicUser> {
        self.send(Method::POST, "/api/register", Some(request)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<PublicUser> {
        self.send(Method::POST, "/api/login", Some(request)).await
    }

    async fn list_users(&self) -> Result<Vec<PublicUser>> {
        self.send::<(), _>(Method::GET, "/api/users", None).await
    }

    async fn get_user(&self, id: &str) -> Result<PublicUser> {
        self.send::<(), _>(Method::GET, &format!("/api/users/{id}"), None).await
    }

    async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<PublicUser> {
        self.send(Method::PUT, &format!("/api/users/{id}"), Some(request)).await
    }

    async fn delete_user(&self, id: &str) -> Result<MessageResponse> {
        self.send::<(), _>(Method::DELETE, &format!("/api/users/{id}"), None).await
    }
}

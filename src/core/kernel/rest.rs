use crate::core::errors::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{instrument, trace};

/// Path prefix shared by every endpoint of the chat service.
const API_PREFIX: &str = "/api/v1";

/// REST client trait for talking to the chat service
///
/// The protocol is POST-only JSON; this trait is the seam where tests
/// inject a mock transport. Implementations are purely mechanical: they
/// know nothing about signing or session semantics.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// POST a JSON payload to a named endpoint
    ///
    /// # Arguments
    /// * `endpoint` - The endpoint name, appended after `/api/v1/`
    /// * `body` - Request body as JSON value
    ///
    /// # Returns
    /// The response body as a JSON value, unmodified
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ChatError>;

    /// POST a JSON payload with strongly-typed response
    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T, ChatError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the service, e.g. `http://127.0.0.1:5000`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout_seconds: 30,
            user_agent: "pychat-client/0.1".to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ChatError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ChatError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl ReqwestRest {
    /// Create a new `ReqwestRest` with default settings
    pub fn new(base_url: String) -> Result<Self, ChatError> {
        RestClientBuilder::new(RestClientConfig::new(base_url)).build()
    }

    /// Build the full URL for an endpoint name
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}/{}", self.config.base_url, API_PREFIX, endpoint)
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(status = %response.status()))]
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, ChatError> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ChatError::NetworkError(format!("Failed to read response body: {}", e)))?;

        trace!("Response body: {}", response_text);

        if status.is_success() {
            serde_json::from_str(&response_text).map_err(|e| {
                ChatError::DeserializationError(format!("Failed to parse JSON response: {}", e))
            })
        } else {
            Err(ChatError::HttpStatus {
                status: status.as_u16(),
                body: response_text,
            })
        }
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ChatError> {
        let body_bytes = serde_json::to_vec(body).map_err(|e| {
            ChatError::SerializationError(format!("Failed to serialize request body: {}", e))
        })?;

        let response = self
            .client
            .post(self.build_url(endpoint))
            .header("Content-Type", "application/json")
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| ChatError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }

    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T, ChatError> {
        self.post(endpoint, body).await.and_then(|value| {
            serde_json::from_value(value).map_err(|e| {
                ChatError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
            })
        })
    }
}

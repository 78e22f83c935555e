//! HTTP implementation of the conversation client
//!
//! Endpoints are resolved relative to `api.base_url`:
//!
//! - `POST /conversations {title, mode}` -> `{conversation: {id}}`
//! - `GET /conversations/{id}` -> 200 or 404
//! - `POST /conversations/{id}/messages {message}` -> `{assistant_message}`
//! - `POST /chat/quick {message}` -> `{success, assistant_message}`
//!
//! Every request carries `Authorization: Bearer <token>`. A missing token is
//! a precondition failure and no request is sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::TokenSource;
use crate::client::wire::{
    id_to_string, CreateConversationRequest, CreateConversationResponse, MessageRequest,
    PostMessageResponse, QuickMessageResponse,
};
use crate::client::ConversationClient;
use crate::config::ApiConfig;
use crate::error::{ChatError, ClientResult, Result};
use crate::session::Message;

/// Conversation client for the dashboard backend
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sponsorchat::auth::StaticTokenSource;
/// use sponsorchat::client::HttpConversationClient;
/// use sponsorchat::config::ApiConfig;
///
/// let config = ApiConfig {
///     base_url: "http://localhost:8000/api".to_string(),
///     timeout_seconds: 30,
/// };
/// let client = HttpConversationClient::new(&config, Arc::new(StaticTokenSource::new("t")));
/// assert!(client.is_ok());
/// ```
pub struct HttpConversationClient {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpConversationClient {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be built
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ChatError::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::Config(format!(
                "api.base_url '{}' cannot carry a path",
                config.base_url
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("sponsorchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized conversation client: base_url={}", base_url);

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    /// Backend base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments below the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> ClientResult<RequestBuilder> {
        let token = self
            .tokens
            .current_token()
            .ok_or_else(|| ChatError::Unauthorized("no credential available".to_string()))?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn execute(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Conversation request failed: {}", e);
            ChatError::BackendUnavailable(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            if status == StatusCode::UNAUTHORIZED {
                self.tokens.on_unauthorized();
            }
            return Err(ChatError::Unauthorized(format!("backend returned {}", status)));
        }
        Ok(response)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> ClientResult<Response> {
        tracing::debug!("POST {}", url);
        let builder = self.request(Method::POST, url)?.json(body);
        self.execute(builder).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse backend response: {}", e);
            ChatError::BackendUnavailable(format!("malformed response: {}", e))
        })
    }

    /// Turn a non-success status into the backend taxonomy
    async fn unexpected_status(response: Response) -> ChatError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Backend returned error {}: {}", status, body);
        ChatError::BackendUnavailable(format!("backend returned {}", status))
    }
}

#[async_trait]
impl ConversationClient for HttpConversationClient {
    async fn create_conversation(&self, title: &str, mode: &str) -> ClientResult<String> {
        let url = self.endpoint(&["conversations"]);
        let response = self
            .post_json(url, &CreateConversationRequest { title, mode })
            .await?;
        if !response.status().is_success() {
            return Err(Self::unexpected_status(response).await);
        }

        let body: CreateConversationResponse = Self::read_json(response).await?;
        let id = id_to_string(&body.conversation.id).ok_or_else(|| {
            ChatError::BackendUnavailable("created conversation has no id".to_string())
        })?;
        tracing::info!("Created conversation {} (mode={})", id, mode);
        Ok(id)
    }

    async fn conversation_exists(&self, conversation_id: &str) -> ClientResult<bool> {
        let url = self.endpoint(&["conversations", conversation_id]);
        tracing::debug!("GET {}", url);
        let response = self.execute(self.request(Method::GET, url)?).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => {
                tracing::info!("Conversation {} no longer exists", conversation_id);
                Ok(false)
            }
            _ => Err(Self::unexpected_status(response).await),
        }
    }

    async fn post_message(&self, conversation_id: &str, text: &str) -> ClientResult<Message> {
        let url = self.endpoint(&["conversations", conversation_id, "messages"]);
        let response = self.post_json(url, &MessageRequest { message: text }).await?;

        match response.status() {
            status if status.is_success() => {
                let body: PostMessageResponse = Self::read_json(response).await?;
                Ok(body.assistant_message.into_message())
            }
            StatusCode::NOT_FOUND => Err(ChatError::ConversationNotFound(
                conversation_id.to_string(),
            )),
            _ => Err(Self::unexpected_status(response).await),
        }
    }

    async fn quick_message(&self, text: &str) -> ClientResult<Message> {
        let url = self.endpoint(&["chat", "quick"]);
        let response = self.post_json(url, &MessageRequest { message: text }).await?;
        if !response.status().is_success() {
            return Err(Self::unexpected_status(response).await);
        }

        let body: QuickMessageResponse = Self::read_json(response).await?;
        match body.assistant_message {
            Some(message) if body.success => Ok(message.into_message()),
            _ => Err(ChatError::BackendUnavailable(
                "quick chat did not return a reply".to_string(),
            )),
        }
    }
}

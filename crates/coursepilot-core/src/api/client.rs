use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::ApiSettings;
use crate::constants::endpoints;
use crate::error::PilotError;

use super::planner::AiPlan;
use super::traits::{ApiRequest, Dispatcher};
use super::types::{ChatListItem, ChatRequest, ChatResponse, Message, SummarizeRequest, SummarizeResponse};

/// Typed calls against the dashboard backend.
///
/// Cheap to clone; the transport is shared. Every method takes the
/// cancellation token for that call so the caller can tell afterwards
/// whether the outcome still applies.
#[derive(Clone)]
pub struct ApiClient {
    dispatcher: Arc<dyn Dispatcher>,
    request_timeout: Duration,
    generation_timeout: Duration,
}

impl ApiClient {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, settings: &ApiSettings) -> Self {
        Self {
            dispatcher,
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
            generation_timeout: Duration::from_millis(settings.generation_timeout_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }

    pub async fn send_chat(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<ChatResponse, PilotError> {
        let body = serde_json::to_value(request)?;
        let req = ApiRequest::post(endpoints::CHAT, body, self.request_timeout);
        self.call(req, cancel).await
    }

    pub async fn list_chats(&self, cancel: &CancellationToken) -> Result<Vec<ChatListItem>, PilotError> {
        let req = ApiRequest::get(endpoints::CHATS, self.request_timeout);
        self.call(req, cancel).await
    }

    pub async fn chat_messages(&self, chat_id: &str, cancel: &CancellationToken) -> Result<Vec<Message>, PilotError> {
        let req = ApiRequest::get(endpoints::chat_messages(chat_id), self.request_timeout);
        self.call(req, cancel).await
    }

    pub async fn delete_chat(&self, chat_id: &str, cancel: &CancellationToken) -> Result<(), PilotError> {
        let req = ApiRequest::delete(endpoints::chat(chat_id), self.request_timeout);
        self.dispatcher.dispatch(req, cancel).await.map(|_| ())
    }

    /// Study plan generation. Runs with the generation timeout, not the
    /// regular one; the backend can take minutes.
    pub async fn generate_plan(&self, force_regenerate: bool, cancel: &CancellationToken) -> Result<AiPlan, PilotError> {
        let mut req = ApiRequest::post(
            endpoints::PLANNER_GENERATE,
            Value::Object(Default::default()),
            self.generation_timeout,
        );
        if force_regenerate {
            req = req.with_query("force_regenerate", "true");
        }
        self.call(req, cancel).await
    }

    pub async fn summarize(&self, text: &str, cancel: &CancellationToken) -> Result<String, PilotError> {
        let body = serde_json::to_value(SummarizeRequest { text })?;
        let req = ApiRequest::post(endpoints::SUMMARIZE, body, self.request_timeout);
        let resp: SummarizeResponse = self.call(req, cancel).await?;
        Ok(resp.summary)
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest, cancel: &CancellationToken) -> Result<T, PilotError> {
        let value = self.dispatcher.dispatch(request, cancel).await?;
        serde_json::from_value(value).map_err(|e| PilotError::parse(None, e.to_string()))
    }
}

use crate::error::PilotError;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A single backend call. The timeout is chosen per call: AI generation
/// endpoints get a much longer one than plain REST reads.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout,
            requires_auth: true,
        }
    }

    pub fn get(path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Method::Get, path, timeout)
    }

    pub fn post(path: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self::new(Method::Post, path, timeout).with_body(body)
    }

    pub fn delete(path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Method::Delete, path, timeout)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// `path?k=v` form used in logs and error messages.
    pub fn endpoint(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Transport seam between the API client and the network.
///
/// Implementations must race the call against `request.timeout` and against
/// `cancel`. A fired timer cancels `cancel` and yields
/// [`PilotError::Timeout`]; an external cancellation yields
/// [`PilotError::Cancelled`]. A response that loses either race is dropped.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: ApiRequest, cancel: &CancellationToken) -> Result<Value, PilotError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_query() {
        let req = ApiRequest::post("/api/ai-planner/generate", Value::Null, Duration::from_secs(1))
            .with_query("force_regenerate", "true");
        assert_eq!(req.endpoint(), "/api/ai-planner/generate?force_regenerate=true");
        assert_eq!(req.method.as_str(), "POST");
    }

    #[test]
    fn test_requests_require_auth_by_default() {
        let req = ApiRequest::get("/api/chats", Duration::from_secs(1));
        assert!(req.requires_auth);
        assert!(!req.without_auth().requires_auth);
    }
}

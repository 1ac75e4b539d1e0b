use crate::error::PilotError;
use serde_json::Value;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::traits::{ApiRequest, Dispatcher, Method};

/// [`Dispatcher`] over HTTP with a bearer token.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: &ApiRequest, cancel: &CancellationToken) -> Result<Value, PilotError> {
        let token = if request.requires_auth {
            let token = self
                .token
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| PilotError::Auth("Not authenticated: no API token configured".into()))?;
            Some(token)
        } else {
            None
        };

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let call = async {
            let response = builder.send().await.map_err(|e| network_error(request, e))?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| network_error(request, e))?;
            Ok::<_, PilotError>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PilotError::Cancelled),
            _ = tokio::time::sleep(request.timeout) => {
                cancel.cancel();
                return Err(timeout_error(request));
            }
            result = call => result?,
        };

        decode_response(status, &body)
    }
}

#[async_trait::async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, request: ApiRequest, cancel: &CancellationToken) -> Result<Value, PilotError> {
        let request_id = Uuid::new_v4();
        let endpoint = request.endpoint();
        let started = Instant::now();
        tracing::debug!(
            %request_id,
            method = request.method.as_str(),
            %endpoint,
            timeout_ms = request.timeout.as_millis() as u64,
            "dispatching request"
        );

        let result = self.execute(&request, cancel).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(
                %request_id,
                method = request.method.as_str(),
                %endpoint,
                elapsed_ms,
                outcome = "ok",
                "request completed"
            ),
            Err(e) => tracing::warn!(
                %request_id,
                method = request.method.as_str(),
                %endpoint,
                elapsed_ms,
                outcome = e.kind(),
                error = %e,
                "request failed"
            ),
        }
        result
    }
}

fn timeout_error(request: &ApiRequest) -> PilotError {
    PilotError::Timeout {
        endpoint: request.endpoint(),
        after: request.timeout,
    }
}

fn network_error(request: &ApiRequest, e: reqwest::Error) -> PilotError {
    if e.is_timeout() {
        return timeout_error(request);
    }
    PilotError::Network(e.to_string())
}

/// Turn a status and raw body into a JSON value or a typed failure.
pub(crate) fn decode_response(status: u16, body: &[u8]) -> Result<Value, PilotError> {
    let blank = body.iter().all(u8::is_ascii_whitespace);

    if (200..300).contains(&status) {
        if blank {
            return Ok(Value::Null);
        }
        return serde_json::from_slice(body).map_err(|e| PilotError::parse(None, e.to_string()));
    }

    let detail = if blank {
        None
    } else {
        let parsed: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) if status == 401 || status == 403 => {
                tracing::debug!(status, error = %e, "unreadable auth error body");
                Value::Null
            }
            Err(e) => {
                return Err(PilotError::parse(
                    Some(status),
                    format!("unreadable error body: {e}"),
                ))
            }
        };
        extract_detail(&parsed)
    };
    let detail = detail.unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        401 | 403 => Err(PilotError::Auth(detail)),
        _ => Err(PilotError::http(status, detail)),
    }
}

fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

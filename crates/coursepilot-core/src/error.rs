use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    /// The request was still pending when its timer fired.
    #[error(
        "Request to {endpoint} timed out after {}. The AI is working hard on it - please try again.",
        format_duration(.after)
    )]
    Timeout { endpoint: String, after: Duration },

    /// No response at all: connection refused, DNS, TLS.
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be decoded.
    #[error("Parse error{}: {message}", status_suffix(.status))]
    Parse { status: Option<u16>, message: String },

    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PilotError {
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
        }
    }

    pub fn parse(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Parse {
            status,
            message: message.into(),
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Network(_) => "network",
            Self::Parse { .. } => "parse",
            Self::Http { .. } => "http",
            Self::Auth(_) => "auth",
            Self::Cancelled => "cancelled",
            Self::Invalid(_) => "invalid",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// "Try again" class of failures, as opposed to "fix your input".
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network(_) | Self::Parse { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether an automatic retry is worthwhile. Timeouts are excluded: the
    /// server is usually still generating and a retry only piles on work.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Parse { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { .. } => self.to_string(),
            Self::Network(_) => {
                "Network connection error. Please check your internet connection and try again."
                    .to_string()
            }
            Self::Parse { .. } => {
                "Response parsing error. The server response may be corrupted.".to_string()
            }
            Self::Http { status, detail } if *status < 500 => detail.clone(),
            Self::Http { .. } => "The server ran into a problem. Please try again.".to_string(),
            Self::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::Invalid(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Whole seconds read as "120 seconds"; anything finer is shown in ms.
pub(crate) fn format_duration(d: &Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 && ms % 1000 == 0 {
        let secs = ms / 1000;
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    } else {
        format!("{ms} ms")
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_seconds_and_retry() {
        let err = PilotError::Timeout {
            endpoint: "/api/ai-planner/generate".into(),
            after: Duration::from_millis(120_000),
        };
        let msg = err.to_string();
        assert!(msg.contains("120 seconds"));
        assert!(msg.contains("try again"));
        assert!(err.is_timeout());
        assert!(err.is_transient());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&Duration::from_secs(1)), "1 second");
        assert_eq!(format_duration(&Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_duration(&Duration::from_millis(250)), "250 ms");
        assert_eq!(format_duration(&Duration::from_millis(1500)), "1500 ms");
    }

    #[test]
    fn test_http_classification() {
        assert!(!PilotError::http(422, "bad").is_transient());
        assert!(!PilotError::http(404, "missing").is_retryable());
        assert!(PilotError::http(503, "down").is_transient());
        assert!(PilotError::http(500, "boom").is_retryable());
        assert_eq!(PilotError::http(400, "Message is empty").user_message(), "Message is empty");
    }

    #[test]
    fn test_parse_error_display_includes_status() {
        let err = PilotError::parse(Some(502), "expected value");
        assert_eq!(err.to_string(), "Parse error (HTTP 502): expected value");
        let err = PilotError::parse(None, "eof");
        assert_eq!(err.to_string(), "Parse error: eof");
    }

    #[test]
    fn test_auth_is_not_retried() {
        let err = PilotError::Auth("expired".into());
        assert!(!err.is_transient());
        assert!(!err.is_retryable());
    }
}

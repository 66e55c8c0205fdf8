//! # HTTP Transport
//!
//! A minimal request/response model so the API client can run against
//! gloo-net in the browser and against an in-memory backend in tests.
//! Non-2xx responses are turned into [`ApiError::Http`] carrying the
//! server's `detail` text.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Header carrying Telegram-signed init data
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

const FALLBACK_MESSAGE: &str = "API error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Outgoing request; `url` already contains the encoded query string
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Implementations report connection failures as
/// [`ApiError::Network`] and return every HTTP response, successful or not.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Supplies the init data attached to each request
pub trait InitDataSource {
    fn init_data(&self) -> Option<String>;
}

impl<F> InitDataSource for F
where
    F: Fn() -> Option<String>,
{
    fn init_data(&self) -> Option<String> {
        self()
    }
}

/// Source that never has init data (outside Telegram)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInitData;

impl InitDataSource for NoInitData {
    fn init_data(&self) -> Option<String> {
        None
    }
}

/// Failure of an API call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Non-2xx response; `message` is the server's `detail` or raw body
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Failed to serialize request: {0}")]
    Encode(String),
}

impl ApiError {
    /// Build an error from a non-2xx response
    pub fn from_response(response: &HttpResponse) -> Self {
        ApiError::Http {
            status: response.status,
            message: extract_detail(&response.body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// 401 raised while the host has not delivered init data yet
    pub fn is_missing_init_data(&self) -> bool {
        match self {
            ApiError::Http { status: 401, message } => {
                message.to_lowercase().contains("missing init data")
            }
            _ => false,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// `{"detail": "text"}` yields the text, a validation list yields its joined
/// `msg` entries, anything else yields the trimmed body.
pub fn extract_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return FALLBACK_MESSAGE.to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return detail.trim().to_string();
            }
            Some(Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }

    trimmed.to_string()
}

//! The remote call seam
//!
//! [`GlueTransport`] is the single point where a request leaves the process.
//! [`HttpTransport`] speaks the service's JSON RPC convention: every
//! operation is a `POST /` whose target is named by the `X-Amz-Target`
//! header. Request signing, retries and credential resolution are not done
//! here; point the endpoint at something that handles them when required.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// Prefix of the `X-Amz-Target` header value
pub const TARGET_PREFIX: &str = "AWSGlue";

/// Content type of every request body
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent string for gluectl HTTP requests
pub const USER_AGENT: &str = concat!("gluectl/", env!("CARGO_PKG_VERSION"));

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Errors produced while performing one remote call
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not resolve host for {endpoint}: {message}")]
    NameResolution { endpoint: String, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with an error document
    #[error("{code}: {message} (HTTP {status})")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid transport configuration: {0}")]
    Configuration(String),
}

impl TransportError {
    pub fn is_name_resolution(&self) -> bool {
        matches!(self, TransportError::NameResolution { .. })
    }

    /// Service error code, if the service answered
    pub fn code(&self) -> Option<&str> {
        match self {
            TransportError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            TransportError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code(),
            Some("EntityNotFoundException" | "ResourceNotFoundException")
        ) || self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.code(),
            Some(
                "AccessDeniedException"
                    | "UnrecognizedClientException"
                    | "InvalidSignatureException"
                    | "ExpiredTokenException"
            )
        ) || matches!(self.status(), Some(401 | 403))
    }

    pub fn is_throttled(&self) -> bool {
        matches!(
            self.code(),
            Some("ThrottlingException" | "TooManyRequestsException")
        ) || self.status() == Some(429)
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(
            self.code(),
            Some("InvalidInputException" | "ValidationException" | "SerializationException")
        )
    }
}

/// Performs one remote operation call
#[async_trait]
pub trait GlueTransport: Send + Sync {
    /// Invoke `operation` with the JSON request document
    async fn call(&self, operation: &str, request: &Value) -> Result<Value, TransportError>;

    /// Endpoint the transport talks to, used in diagnostics
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: GlueTransport + ?Sized> GlueTransport for Arc<T> {
    async fn call(&self, operation: &str, request: &Value) -> Result<Value, TransportError> {
        (**self).call(operation, request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra static headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: url::Url,
    endpoint_text: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let endpoint = url::Url::parse(&config.endpoint).map_err(|e| {
            TransportError::Configuration(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Configuration(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        debug!("HTTP transport ready for {}", endpoint);
        Ok(Self {
            client,
            endpoint_text: config.endpoint,
            endpoint,
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        let message = error_chain(&err);
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if is_dns_failure(&message) {
            TransportError::NameResolution {
                endpoint: self.endpoint_text.clone(),
                message,
            }
        } else {
            TransportError::Connection(message)
        }
    }
}

#[async_trait]
impl GlueTransport for HttpTransport {
    async fn call(&self, operation: &str, request: &Value) -> Result<Value, TransportError> {
        let target = format!("{}.{}", TARGET_PREFIX, operation);
        trace!("POST {} ({})", self.endpoint, target);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Amz-Target", target)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(request.to_string())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        trace!("{} answered HTTP {} ({} bytes)", operation, status, body.len());

        if status.is_success() {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Object(serde_json::Map::new()));
            }
            return serde_json::from_slice(&body)
                .map_err(|e| TransportError::InvalidResponse(format!("{}: {}", operation, e)));
        }

        Err(service_error(status.as_u16(), error_type.as_deref(), &body))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint_text
    }
}

/// Decode an error document (`__type` / `message`), falling back to the
/// error-type header and the raw body
fn service_error(status: u16, error_type: Option<&str>, body: &[u8]) -> TransportError {
    let document: Option<Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        document
            .as_ref()
            .and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = error_type
        .map(str::to_string)
        .or_else(|| field("__type"))
        .or_else(|| field("code"))
        .map(|raw| normalize_error_code(&raw))
        .unwrap_or_else(|| format!("Http{}", status));

    let message = field("message")
        .or_else(|| field("Message"))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    TransportError::Service {
        status,
        code,
        message,
    }
}

/// `com.amazonaws.glue#EntityNotFoundException` and
/// `ValidationException:http://internal/...` both become the bare code
fn normalize_error_code(raw: &str) -> String {
    let without_uri = raw.split(':').next().unwrap_or(raw);
    without_uri
        .rsplit('#')
        .next()
        .unwrap_or(without_uri)
        .trim()
        .to_string()
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_dns_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname",
        "no such host",
        "temporary failure in name resolution",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_error_code() {
        assert_eq!(
            normalize_error_code("com.amazonaws.glue#EntityNotFoundException"),
            "EntityNotFoundException"
        );
        assert_eq!(
            normalize_error_code("ValidationException:http://internal.amazon.com/coral/"),
            "ValidationException"
        );
        assert_eq!(normalize_error_code("InvalidInputException"), "InvalidInputException");
    }

    #[test]
    fn test_service_error_prefers_header_code() {
        let body = br#"{"__type":"com.amazonaws.glue#Other","message":"nope"}"#;
        let err = service_error(400, Some("AccessDeniedException:http://x"), body);
        assert_eq!(err.code(), Some("AccessDeniedException"));
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_service_error_reads_capitalised_message() {
        let body = br#"{"__type":"EntityNotFoundException","Message":"Job j1 not found"}"#;
        let err = service_error(400, None, body);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Job j1 not found"));
    }

    #[test]
    fn test_service_error_without_document() {
        let err = service_error(502, None, b"Bad Gateway");
        assert_eq!(err.code(), Some("Http502"));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_dns_failure_detection() {
        assert!(is_dns_failure(
            "error sending request: client error (Connect): dns error: failed to lookup address information"
        ));
        assert!(!is_dns_failure("connection refused"));
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = HttpTransport::new(TransportConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config =
            TransportConfig::new("http://localhost:1").with_header("bad header", "value");
        let err = HttpTransport::new(config).unwrap_err();
        assert!(err.to_string().contains("bad header"));
    }
}

//! Minimal HTTP client with safe logging and streaming bodies.
//!
//! - Request options: headers, query params, timeout
//! - Secret headers are marked sensitive and never logged
//! - No retries: one request is one attempt, callers decide what a failure means
//! - Optional *raw* response logging via `TWEETMILL_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), tweetmill_http::HttpError> {
//! let client = tweetmill_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", tweetmill_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response status, body snippets (truncated), and final errors.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "TWEETMILL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl HttpError {
    /// HTTP status for API errors, `None` for transport/decode failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body of a streaming response, chunked as it arrives from the server.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use tweetmill_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("pid", Cow::Borrowed("20"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

/// Build a header value for an API key, marked sensitive so it never reaches logs.
///
/// ```
/// let v = tweetmill_http::secret_header(" 'abc123' ").unwrap();
/// assert!(v.is_sensitive());
/// assert_eq!(v.to_str().unwrap(), "abc123");
/// ```
pub fn secret_header(raw: &str) -> Result<HeaderValue, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }

    let mut value = HeaderValue::from_str(&s)
        .map_err(|e| HttpError::Build(format!("invalid API key header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// The base is treated as a directory, so `http://host/ollama` and
    /// `http://host/ollama/` resolve `api/tags` identically.
    ///
    /// ```no_run
    /// use tweetmill_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default whole-request timeout for non-streaming calls.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let resp = self
            .send::<()>(Method::GET, path, None, &opts, Some(timeout))
            .await?;
        decode_json(resp).await
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let resp = self
            .send(Method::POST, path, Some(body), &opts, Some(timeout))
            .await?;
        decode_json(resp).await
    }

    /// POST a JSON body and hand back the response body as a chunk stream.
    ///
    /// Only the connect timeout applies; a generation may legitimately stream
    /// for longer than any fixed request timeout.
    pub async fn post_stream<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<ByteStream, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let resp = self
            .send(Method::POST, path, Some(body), &opts, opts.timeout)
            .await?;
        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| HttpError::Network(e.to_string())));
        Ok(Box::pin(stream))
    }

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    fn build<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
        timeout: Option<Duration>,
    ) -> Result<RequestBuilder, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let mut rb = self.inner.request(method, url);
        if let Some(t) = timeout {
            rb = rb.timeout(t);
        }
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }
        if let Some(b) = body {
            let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }
        Ok(rb)
    }

    /// Send one request and return the response if its status is 2xx.
    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
        timeout: Option<Duration>,
    ) -> Result<Response, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        let req_id = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            req_id,
            method = %method,
            host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query = ?redact_query(opts.query.as_deref()),
            headers = ?opts.headers.as_ref().map(redact_headers),
            timeout_ms = ?timeout.map(|t| t.as_millis() as u64),
            has_body = body.is_some(),
            "http.request.start"
        );

        let rb = self.build(method, url, body, opts, timeout)?;
        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(req_id, message = %err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;

        let status = resp.status();
        tracing::debug!(
            req_id,
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            "http.response"
        );

        if status.is_success() {
            return Ok(resp);
        }

        let bytes = resp.bytes().await.unwrap_or_default();
        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id,
            %status,
            message = %message,
            body_snippet = %snip_body(&bytes),
            "http.error"
        );
        Err(HttpError::Api { status, message })
    }
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T, HttpError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))?;

    if raw_enabled() {
        let mut body = bytes.to_vec();
        let truncated = body.len() > RAW_MAX_BODY;
        body.truncate(RAW_MAX_BODY);
        tracing::info!(
            target: "http.raw",
            body = %String::from_utf8_lossy(&body),
            truncated,
            "response"
        );
    }

    serde_json::from_slice::<T>(&bytes).map_err(|e| {
        let snippet = snip_body(&bytes);
        tracing::warn!(
            serde_line = e.line(),
            serde_col = e.column(),
            serde_err = %e,
            body_snippet = %snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // RapidAPI: {"message":"..."}; Ollama: {"error":"..."}
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(body) {
        for key in ["message", "error", "detail"] {
            if let Some(s) = map.get(key).and_then(|v| v.as_str()) {
                if !s.is_empty() {
                    return s.to_string();
                }
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let snip = String::from_utf8_lossy(body);
    if snip.len() > SNIPPET_MAX {
        let mut end = SNIPPET_MAX;
        while !snip.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &snip[..end])
    } else {
        snip.into_owned()
    }
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if v.is_sensitive() || is_secret_name(k.as_str()) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (k.as_str().to_string(), val)
        })
        .collect()
}

fn redact_query(q: Option<&[(&str, Cow<'_, str>)]>) -> Vec<(String, String)> {
    q.unwrap_or_default()
        .iter()
        .map(|(k, v)| {
            let val = if is_secret_name(k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            ((*k).to_string(), val)
        })
        .collect()
}

fn is_secret_name(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization"
            | "x-rapidapi-key"
            | "x-api-key"
            | "access_token"
            | "api_key"
            | "key"
            | "token"
            | "secret"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    #[test]
    fn sensitive_and_named_secrets_are_redacted() {
        let mut h = HeaderMap::new();
        h.insert(
            HeaderName::from_static("x-rapidapi-key"),
            HeaderValue::from_static("plain"),
        );
        h.insert(
            HeaderName::from_static("x-custom"),
            secret_header("hidden").unwrap(),
        );
        h.insert(
            HeaderName::from_static("x-rapidapi-host"),
            HeaderValue::from_static("twitter241.p.rapidapi.com"),
        );

        let redacted = redact_headers(&h);
        let get = |name: &str| {
            redacted
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("x-rapidapi-key"), Some("<redacted>"));
        assert_eq!(get("x-custom"), Some("<redacted>"));
        assert_eq!(get("x-rapidapi-host"), Some("twitter241.p.rapidapi.com"));
    }

    #[test]
    fn query_secrets_are_redacted() {
        let q = vec![("pid", Cow::Borrowed("42")), ("token", Cow::Borrowed("t"))];
        let redacted = redact_query(Some(&q));
        assert_eq!(redacted[0], ("pid".into(), "42".into()));
        assert_eq!(redacted[1], ("token".into(), "<redacted>".into()));
    }

    #[test]
    fn blank_secret_is_rejected() {
        assert!(secret_header("  ").is_err());
        assert!(secret_header("\"\"").is_err());
    }

    #[test]
    fn error_message_prefers_known_fields() {
        assert_eq!(extract_error_message(br#"{"message":"quota"}"#), "quota");
        assert_eq!(
            extract_error_message(br#"{"error":"model not found"}"#),
            "model not found"
        );
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn long_bodies_are_snipped() {
        let body = "x".repeat(SNIPPET_MAX + 10);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert_eq!(snip.len(), SNIPPET_MAX + 3);
    }

    #[test]
    fn base_is_treated_as_directory() {
        let client = HttpClient::new("http://localhost:11434/proxy").unwrap();
        let url = client.resolve("api/tags").unwrap();
        assert_eq!(url.as_str(), "http://localhost:11434/proxy/api/tags");

        let client = HttpClient::new("http://localhost:11434").unwrap();
        let url = client.resolve("/api/generate").unwrap();
        assert_eq!(url.as_str(), "http://localhost:11434/api/generate");
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "nope"})),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<serde_json::Value>("missing", RequestOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<serde_json::Value>("anything", RequestOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(..)));
    }
}

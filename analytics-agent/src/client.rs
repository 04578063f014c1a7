//! HTTP request execution against the analytics API.

use analytics_core::{AnalyticsError, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Parsed response body with the HTTP status injected under `status`.
pub type ApiResponse = serde_json::Map<String, Value>;

/// Key under which the HTTP status code is stored in an [`ApiResponse`].
pub const STATUS_KEY: &str = "status";

/// `User-Agent` header sent with every request.
pub const USER_AGENT: &str = concat!("analytics-agent/", env!("CARGO_PKG_VERSION"));

/// Normalize an API base URL by removing trailing slashes.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Connection settings applied when building the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportOptions {
    /// Require TLS for the connection
    pub use_ssl: bool,
    /// Connect and request timeout in seconds
    pub timeout: Option<f64>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            use_ssl: true,
            timeout: None,
        }
    }
}

impl TransportOptions {
    /// The configured timeout as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Config`] for negative or non-finite values.
    pub fn timeout_duration(&self) -> Result<Option<Duration>> {
        self.timeout
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| AnalyticsError::Config(format!("Invalid timeout {}: {}", secs, e)))
            })
            .transpose()
    }
}

/// Build an HTTP client for one request.
///
/// With `use_ssl` the client refuses plain-HTTP connections. A timeout, when
/// set, bounds both connecting and the whole request.
pub fn build_http_client(options: &TransportOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .https_only(options.use_ssl);

    if let Some(timeout) = options.timeout_duration()? {
        builder = builder.connect_timeout(timeout).timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| AnalyticsError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Join the API base and an endpoint path into a request URL.
///
/// The scheme follows `use_ssl` (`https` or `http`); host, port and any base
/// path come from `api_base`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Network`] if the result is not a usable URL.
pub fn request_url(api_base: &str, path: &str, use_ssl: bool) -> Result<Url> {
    let raw = format!("{}{}", normalize_url(api_base), path);
    let mut url = Url::parse(&raw)
        .map_err(|e| AnalyticsError::Network(format!("Invalid URL '{}': {}", raw, e)))?;

    let scheme = if use_ssl { "https" } else { "http" };
    if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
        return Err(AnalyticsError::Network(format!(
            "Cannot use scheme '{}' for URL '{}'",
            scheme, raw
        )));
    }

    Ok(url)
}

/// Parse a response body and inject the status code.
///
/// An existing `status` field in the body is overwritten.
///
/// # Errors
///
/// Returns [`AnalyticsError::Parse`] if the body is not a JSON object.
pub fn parse_body(status: StatusCode, text: &str, endpoint: &str) -> Result<ApiResponse> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        AnalyticsError::Parse(format!(
            "Failed to parse JSON response from {}: {}",
            endpoint, e
        ))
    })?;

    let mut body = match value {
        Value::Object(body) => body,
        other => {
            return Err(AnalyticsError::Parse(format!(
                "Expected a JSON object from {}, got {}",
                endpoint,
                json_kind(&other)
            )))
        }
    };

    body.insert(STATUS_KEY.to_string(), Value::from(status.as_u16()));
    Ok(body)
}

/// Perform a single GET with query parameters and parse the JSON body.
///
/// No retries: a failed attempt is returned to the caller as is.
pub async fn api_request(
    options: &TransportOptions,
    api_base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<ApiResponse> {
    let client = build_http_client(options)?;
    let url = request_url(api_base, path, options.use_ssl)?;

    debug!("GET {}", path);

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| request_error(e, path))?;

    handle_response(response, path).await
}

/// Read the body of a response and hand it to [`parse_body`].
async fn handle_response(response: Response, endpoint: &str) -> Result<ApiResponse> {
    let status = response.status();
    debug!("{} responded with {}", endpoint, status);

    let text = response
        .text()
        .await
        .map_err(|e| request_error(e, endpoint))?;

    parse_body(status, &text, endpoint)
}

fn request_error(err: reqwest::Error, endpoint: &str) -> AnalyticsError {
    warn!("Request to {} failed: {}", endpoint, err);

    if err.is_timeout() {
        AnalyticsError::Timeout(format!("{}: {}", endpoint, err))
    } else {
        AnalyticsError::Network(format!("Failed to reach {}: {}", endpoint, err))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

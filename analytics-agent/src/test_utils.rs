//! Test utilities for agent testing
//!
//! Provides a mock analytics API that records every request and answers
//! with a canned status and body.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request as seen by the mock server
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Request path without the query string
    pub path: String,
    /// Query string exactly as received
    pub raw_query: String,
    /// Decoded query parameters, in order
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// First decoded value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock server state
#[derive(Debug, Clone)]
pub struct MockServerState {
    /// Requests received so far
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Status code and body served for every request
    response: Arc<Mutex<(u16, String)>>,
    /// Delay before answering
    delay: Arc<Mutex<Duration>>,
}

impl Default for MockServerState {
    fn default() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new((200, "{}".to_string()))),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
}

impl MockServerState {
    /// Serve `body` with `status` from now on
    pub fn respond_with(&self, status: u16, body: String) {
        *self.response.lock().unwrap() = (status, body);
    }

    /// Wait this long before answering each request
    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Mock analytics API server
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    /// Create a new mock server
    pub fn new() -> Self {
        Self {
            state: MockServerState::default(),
            port: 0, // Will be assigned when server starts
        }
    }

    /// Start the mock server and return the address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = self.create_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.port = addr.port();

        let server_url = format!("http://127.0.0.1:{}", self.port);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the server state
    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    /// Every path is answered by the recording handler
    fn create_router(&self) -> Router {
        Router::new()
            .fallback(record_handler)
            .with_state(self.state.clone())
    }
}

async fn record_handler(State(state): State<MockServerState>, uri: Uri) -> impl IntoResponse {
    let raw_query = uri.query().unwrap_or_default().to_string();
    let request = RecordedRequest {
        path: uri.path().to_string(),
        params: decode_query(&raw_query),
        raw_query,
    };
    state.requests.lock().unwrap().push(request);

    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = state.response.lock().unwrap().clone();
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Decode an `application/x-www-form-urlencoded` query string
pub fn decode_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_query() {
        let params = decode_query("usernames=a%2Cb&type=detail+view&empty=&flag");

        assert_eq!(
            params,
            vec![
                ("usernames".to_string(), "a,b".to_string()),
                ("type".to_string(), "detail view".to_string()),
                ("empty".to_string(), String::new()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(decode_query("").is_empty());
    }

    #[tokio::test]
    async fn test_mock_server_records_requests() {
        let (server, url) = MockServer::new().start().await.unwrap();
        assert_ne!(server.port(), 0);
        server.state().respond_with(201, r#"{"ok":true}"#.to_string());

        let response = reqwest::get(format!("{}/api/v2/users?org_api_key=k", url))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);

        let request = server.state().last_request().unwrap();
        assert_eq!(request.path, "/api/v2/users");
        assert_eq!(request.param("org_api_key"), Some("k"));
    }
}

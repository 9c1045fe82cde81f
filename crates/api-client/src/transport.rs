use crate::error::ApiError;
use async_trait::async_trait;
use core_types::Token;
use reqwest::Url;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A request to the price service, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    /// Path segments, unescaped. `["stocks", "AAPL", "history"]`.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub bearer: Option<Token>,
    pub body: Option<serde_json::Value>,
}

impl RemoteRequest {
    fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post(segments: &[&str], body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::Post, segments);
        request.body = Some(body);
        request
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_bearer(mut self, token: Token) -> Self {
        self.bearer = Some(token);
        self
    }

    /// The request path, e.g. `/stocks/AAPL/history`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status code and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The generic, abstract interface to the remote price service.
/// Everything that talks to the network goes through this trait, allowing the
/// underlying implementation (live or scripted) to be swapped out.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one exchange. Non-2xx statuses are returned, not raised;
    /// only transport-level failures become errors.
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ApiError>;
}

/// The production transport, backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("stocklens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn url_for(&self, request: &RemoteRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ApiError> {
        let url = self.url_for(&request)?;
        tracing::debug!(method = %request.method, %url, "Sending request to price service.");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, bytes = body.len(), "Price service responded.");
        Ok(RemoteResponse { status, body })
    }
}

#[derive(Debug, Clone)]
enum ScriptedReply {
    Respond(RemoteResponse),
    Fail(String),
}

/// An in-memory transport for deterministic offline tests.
///
/// Replies are queued per `METHOD /path`. Each call consumes the head of the
/// queue, except that the last reply is sticky and is repeated forever.
/// Unscripted routes answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    requests: Mutex<Vec<RemoteRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(method: Method, path: &str) -> String {
        format!("{method} {path}")
    }

    fn push(&self, method: Method, path: &str, reply: ScriptedReply) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(Self::key(method, path))
            .or_default()
            .push_back(reply);
        self
    }

    /// Queues a response for `method path`.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(method, path, ScriptedReply::Respond(RemoteResponse::new(status, body)))
    }

    /// Queues a transport-level failure for `method path`.
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, ScriptedReply::Fail(message.to_string()))
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of requests seen for `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ApiError> {
        let key = Self::key(request.method, &request.path());
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Fail(message)) => Err(ApiError::Transport(message)),
            None => Ok(RemoteResponse::new(404, format!("no scripted reply for {key}"))),
        }
    }
}

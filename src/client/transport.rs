//! HTTP transport abstraction
//!
//! The client never talks to the network directly. It builds a [`Request`]
//! and hands it to a [`Transport`], which returns the raw status and decoded
//! JSON body. Status classification happens one layer up, in the client.

use crate::error::{VaultError, VaultResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Header carrying the client token
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Characters escaped inside one path segment
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// HTTP method, including the server's LIST verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    List,
}

impl Method {
    /// Method name as the server documents it
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::List => "LIST",
        }
    }
}

/// A single API request, addressed by logical path (without the `/v1` prefix)
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl Request {
    /// Create a request for the given method and path
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> VaultResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Look up a query parameter by key
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status plus the decoded body, if there was one
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Option<Value>,
}

impl Response {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }

    /// Server-supplied error messages joined by newlines
    pub fn error_message(&self) -> String {
        self.body
            .as_ref()
            .and_then(|b| b.get("errors"))
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

/// Synchronous request executor
///
/// Implementations must report network-level failures as
/// [`VaultError::Transport`] and return every HTTP status, including 4xx and
/// 5xx, as a [`Response`].
pub trait Transport: Send + Sync {
    /// Execute a request and return the raw response
    fn execute(&self, request: &Request) -> VaultResult<Response>;
}

/// Blocking transport backed by a `ureq` agent
pub struct UreqTransport {
    agent: Agent,
    address: String,
}

impl UreqTransport {
    /// Create a transport for the server at `address` (e.g. `http://127.0.0.1:8200`)
    pub fn new(address: impl AsRef<str>, timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();

        Self {
            agent: config.into(),
            address: address.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Server address this transport talks to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Absolute URL for a logical path; each segment is percent-encoded
    fn url(&self, path: &str) -> String {
        let encoded = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/v1/{}", self.address, encoded)
    }
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &Request,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    if let Some(token) = request.token.as_deref() {
        builder = builder.header(TOKEN_HEADER, token);
    }
    builder
}

fn encode_body(request: &Request) -> VaultResult<Vec<u8>> {
    match &request.body {
        Some(body) => Ok(serde_json::to_vec(body)?),
        None => Ok(Vec::new()),
    }
}

fn transport_error(e: ureq::Error) -> VaultError {
    VaultError::Transport(e.to_string())
}

impl Transport for UreqTransport {
    fn execute(&self, request: &Request) -> VaultResult<Response> {
        let url = self.url(&request.path);
        debug!("{} {}", request.method.as_str(), url);

        let result = match request.method {
            Method::Get => prepare(self.agent.get(url.as_str()), request).call(),
            Method::List => {
                prepare(self.agent.get(url.as_str()).query("list", "true"), request).call()
            }
            Method::Delete => prepare(self.agent.delete(url.as_str()), request).call(),
            Method::Put | Method::Post => {
                let builder = if request.method == Method::Put {
                    self.agent.put(url.as_str())
                } else {
                    self.agent.post(url.as_str())
                };
                let body = encode_body(request)?;
                prepare(builder, request)
                    .header("Content-Type", "application/json")
                    .send(&body[..])
            }
        };

        let mut response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        // Proxies in front of the server may answer errors with HTML
        let body = if text.trim().is_empty() {
            None
        } else if status / 100 == 2 {
            Some(serde_json::from_str(&text)?)
        } else {
            serde_json::from_str(&text).ok()
        };

        Ok(Response { status, body })
    }
}

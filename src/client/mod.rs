//! Vault API client
//!
//! [`Client`] owns a [`Transport`] and the client token. Every call goes
//! through [`Client::send`], which turns non-2xx responses into typed
//! [`VaultError`]s, probing the server when the status is ambiguous.

mod classify;
pub mod transport;

pub use classify::{
    classify_status, disambiguate_unavailable, reclassify_bad_request, Classification, StateProbe,
};
pub use transport::{Method, Request, Response, Transport, UreqTransport};

use crate::error::{VaultError, VaultResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Whether a failed 503 may be resolved by probing the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probing {
    Enabled,
    Disabled,
}

/// Vault API client
pub struct Client {
    transport: Box<dyn Transport>,
    token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client talking HTTP to `address`
    pub fn new(address: &str, token: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            transport: Box::new(UreqTransport::new(address, timeout)),
            token,
        }
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            token: None,
        }
    }

    /// Set the token sent with every request
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Builder-style token setter
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    /// Currently configured token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Execute a request, returning the decoded body of a 2xx response
    ///
    /// A 204 or empty body yields `None`.
    pub fn send(&self, request: Request) -> VaultResult<Option<Value>> {
        self.dispatch(request, Probing::Enabled)
    }

    /// Execute a request against a privileged (`sys/`) endpoint
    ///
    /// These endpoints may answer 400 when the server is uninitialized, so a
    /// BadRequest is re-checked against the server's init state.
    pub fn send_sys(&self, request: Request) -> VaultResult<Option<Value>> {
        self.send(request)
            .map_err(|e| reclassify_bad_request(e, &Unprobed(self)))
    }

    /// Execute a request and decode the body into `T`
    pub fn send_json<T: DeserializeOwned>(&self, request: Request) -> VaultResult<T> {
        decode(self.send(request)?)
    }

    fn dispatch(&self, mut request: Request, probing: Probing) -> VaultResult<Option<Value>> {
        if request.token.is_none() {
            request.token = self.token.clone();
        }

        let response = self.transport.execute(&request)?;
        if response.is_success() {
            return Ok(response.body);
        }

        Err(self.classify_failure(response.status, response.error_message(), probing))
    }

    fn classify_failure(&self, status: u16, message: String, probing: Probing) -> VaultError {
        match classify_status(status, message) {
            Classification::Final(err) => err,
            Classification::Unavailable(message) => match probing {
                Probing::Enabled => disambiguate_unavailable(message, &Unprobed(self)),
                Probing::Disabled => VaultError::Generic { status, message },
            },
        }
    }

    /// Typed error for a failed status, probing the server if it is ambiguous
    pub(crate) fn classify(&self, status: u16, message: String) -> VaultError {
        self.classify_failure(status, message, Probing::Enabled)
    }

    /// Raw response for endpoints that encode state in the status code
    pub(crate) fn execute_raw(&self, mut request: Request) -> VaultResult<Response> {
        if request.token.is_none() {
            request.token = self.token.clone();
        }
        self.transport.execute(&request)
    }
}

/// Decode an optional body into `T`, treating a missing body as JSON null
pub(crate) fn decode<T: DeserializeOwned>(body: Option<Value>) -> VaultResult<T> {
    Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
}

/// Probe adapter that issues its requests with disambiguation turned off
struct Unprobed<'a>(&'a Client);

#[derive(Deserialize)]
struct InitProbe {
    initialized: bool,
}

#[derive(Deserialize)]
struct SealProbe {
    sealed: bool,
}

impl StateProbe for Unprobed<'_> {
    fn probe_initialized(&self) -> VaultResult<bool> {
        let body = self
            .0
            .dispatch(Request::new(Method::Get, "sys/init"), Probing::Disabled)?;
        Ok(decode::<InitProbe>(body)?.initialized)
    }

    fn probe_sealed(&self) -> VaultResult<bool> {
        let body = self
            .0
            .dispatch(Request::new(Method::Get, "sys/seal-status"), Probing::Disabled)?;
        Ok(decode::<SealProbe>(body)?.sealed)
    }
}

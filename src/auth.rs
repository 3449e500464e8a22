//! Login against auth methods
//!
//! A successful login installs the returned client token on the [`Client`],
//! so subsequent calls are made as the authenticated identity.

use crate::client::{Client, Method, Request};
use crate::error::VaultResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

/// Token issued by a login
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenInfo {
    pub client_token: String,
    pub accessor: String,
    pub policies: Vec<String>,
    /// Shape depends on the auth method, e.g. `username` or `org`
    pub metadata: BTreeMap<String, Value>,
    pub lease_duration: u64,
    pub renewable: bool,
}

/// Response of an auth login endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthOutput {
    pub lease_id: String,
    pub renewable: bool,
    pub lease_duration: u64,
    pub auth: TokenInfo,
}

impl Client {
    /// Log in with the userpass method
    pub fn auth_userpass(&mut self, username: &str, password: &str) -> VaultResult<AuthOutput> {
        self.login(
            &format!("auth/userpass/login/{username}"),
            json!({ "password": password }),
        )
    }

    /// Log in with the LDAP method
    pub fn auth_ldap(&mut self, username: &str, password: &str) -> VaultResult<AuthOutput> {
        self.login(
            &format!("auth/ldap/login/{username}"),
            json!({ "password": password }),
        )
    }

    /// Log in with a GitHub personal access token
    pub fn auth_github(&mut self, access_token: &str) -> VaultResult<AuthOutput> {
        self.login("auth/github/login", json!({ "token": access_token }))
    }

    fn login(&mut self, path: &str, body: Value) -> VaultResult<AuthOutput> {
        let output: AuthOutput = self.send_json(Request::new(Method::Post, path).json(&body)?)?;
        info!(
            "Logged in via {} with policies {:?}",
            path, output.auth.policies
        );
        self.set_token(output.auth.client_token.clone());
        Ok(output)
    }
}

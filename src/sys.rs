//! Privileged `sys/` endpoints: init, seal, health and mounts
//!
//! These all go through [`Client::send_sys`], so a 400 from an
//! uninitialized server is reported as Uninitialized.

use crate::client::{decode, Client, Method, Request};
use crate::error::{VaultError, VaultResult};
use crate::kv::Generation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seal state as reported by `sys/seal-status` and `sys/unseal`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealState {
    /// Seal type; not returned by older servers
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub sealed: bool,
    /// Key shares needed to reconstruct the master key
    #[serde(rename = "t")]
    pub threshold: u32,
    /// Key shares the master key was split into
    #[serde(rename = "n")]
    pub shares: u32,
    /// Shares provided so far in the current unseal attempt
    pub progress: u32,
    pub nonce: String,
    pub version: String,
    /// Only returned from unseal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Only returned from unseal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

/// Parameters for initializing a server
#[derive(Debug, Clone, Serialize)]
pub struct InitVaultInput {
    /// Split the master key into this many shares
    #[serde(rename = "secret_shares")]
    pub shares: u32,
    /// This many shares are required to reconstruct the master key
    #[serde(rename = "secret_threshold")]
    pub threshold: u32,
}

/// Keys and root token produced by initialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitVaultOutput {
    pub keys: Vec<String>,
    pub keys_base64: Vec<String>,
    pub root_token: String,
}

/// Body of `sys/health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub initialized: bool,
    pub sealed: bool,
    pub standby: bool,
    pub version: String,
}

/// Secrets engine to mount
#[derive(Debug, Clone, Default, Serialize)]
pub struct Mount {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl Mount {
    /// A key/value engine of the given generation
    pub fn kv(generation: Generation) -> Self {
        let mut options = BTreeMap::new();
        options.insert("version".to_string(), generation.number().to_string());
        Self {
            kind: "kv".to_string(),
            options,
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
struct InitStatus {
    initialized: bool,
}

impl Client {
    /// Whether the server has been initialized
    pub fn is_initialized(&self) -> VaultResult<bool> {
        // Plain send: the sys 400 re-probe would call back into this.
        let status: InitStatus = self.send_json(Request::new(Method::Get, "sys/init"))?;
        Ok(status.initialized)
    }

    /// Current seal state
    pub fn seal_status(&self) -> VaultResult<SealState> {
        decode(self.send_sys(Request::new(Method::Get, "sys/seal-status"))?)
    }

    /// Initialize the server, returning unseal keys and the root token
    pub fn init_vault(&self, input: &InitVaultInput) -> VaultResult<InitVaultOutput> {
        decode(self.send_sys(Request::new(Method::Put, "sys/init").json(input)?)?)
    }

    /// Seal the server
    pub fn seal(&self) -> VaultResult<()> {
        self.send_sys(Request::new(Method::Put, "sys/seal"))
            .map(|_| ())
    }

    /// Submit one unseal key share; `sealed` is false once enough were given
    pub fn unseal(&self, key: &str) -> VaultResult<SealState> {
        let request = Request::new(Method::Put, "sys/unseal")
            .json(&serde_json::json!({ "key": key }))?;
        decode(self.send_sys(request)?)
    }

    /// Check server health
    ///
    /// Health reports state through the status code: 501 is uninitialized,
    /// 503 sealed, 429 an unsealed standby (healthy only if `standby_ok`).
    pub fn health(&self, standby_ok: bool) -> VaultResult<HealthStatus> {
        let mut request = Request::new(Method::Get, "sys/health");
        if standby_ok {
            request = request.query("standbyok", "true");
        }

        let response = self.execute_raw(request)?;
        let message = response.error_message();
        match response.status {
            429 if standby_ok => decode(response.body),
            429 => Err(VaultError::Generic {
                status: 429,
                message: "server is an unsealed standby".to_string(),
            }),
            200 | 472 | 473 => decode(response.body),
            501 => Err(VaultError::Uninitialized(message)),
            503 => Err(VaultError::Sealed(message)),
            status => Err(self.classify(status, message)),
        }
    }

    /// Mount a secrets engine at `path`
    pub fn enable_secrets_mount(&self, path: &str, mount: &Mount) -> VaultResult<()> {
        let request = Request::new(
            Method::Post,
            format!("sys/mounts/{}", path.trim_matches('/')),
        )
        .json(mount)?;
        self.send_sys(request).map(|_| ())
    }

    /// Unmount the secrets engine at `path`
    pub fn disable_secrets_mount(&self, path: &str) -> VaultResult<()> {
        let request = Request::new(
            Method::Delete,
            format!("sys/mounts/{}", path.trim_matches('/')),
        );
        self.send_sys(request).map(|_| ())
    }
}

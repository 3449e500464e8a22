//! Rekey workflow: replace the unseal key shares
//!
//! A rekey is started with the new share layout, then existing unseal keys
//! are submitted one at a time against the operation's nonce until the
//! threshold is met and the server hands back the new keys.

use crate::client::{decode, Client, Method, Request};
use crate::error::VaultResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State of an in-flight rekey
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RekeyState {
    pub started: bool,
    pub nonce: String,
    /// Threshold the new keys will have
    #[serde(rename = "t")]
    pub pending_threshold: u32,
    /// Share count the new keys will have
    #[serde(rename = "n")]
    pub pending_shares: u32,
    /// Keys submitted so far
    pub progress: u32,
    /// Keys needed to complete the rekey
    pub required: u32,
    pub pgp_fingerprints: Option<Vec<String>>,
    pub backup: bool,
}

/// Parameters for starting a rekey
#[derive(Debug, Clone, Default, Serialize)]
pub struct RekeyStartInput {
    #[serde(rename = "secret_shares")]
    pub shares: u32,
    #[serde(rename = "secret_threshold")]
    pub threshold: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pgp_keys: Vec<String>,
    pub backup: bool,
}

/// New key shares produced by a completed rekey
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RekeyKeys {
    pub keys: Vec<String>,
    pub keys_base64: Vec<String>,
    pub pgp_fingerprints: Option<Vec<String>>,
    pub backup: bool,
}

/// Outcome of submitting one key share
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RekeyProgress {
    /// More shares are needed
    Pending(RekeyState),
    /// Threshold met; these are the new keys
    Complete(RekeyKeys),
}

impl Client {
    /// Current rekey state; `started` is false when none is in progress
    pub fn rekey_status(&self) -> VaultResult<RekeyState> {
        decode(self.send_sys(Request::new(Method::Get, "sys/rekey/init"))?)
    }

    /// Begin a rekey
    pub fn rekey_start(&self, input: &RekeyStartInput) -> VaultResult<()> {
        self.send_sys(Request::new(Method::Put, "sys/rekey/init").json(input)?)
            .map(|_| ())
    }

    /// Abandon the rekey in progress, discarding submitted shares
    pub fn rekey_cancel(&self) -> VaultResult<()> {
        self.send_sys(Request::new(Method::Delete, "sys/rekey/init"))
            .map(|_| ())
    }

    /// Submit one existing unseal key for the rekey identified by `nonce`
    pub fn rekey_submit(&self, key: &str, nonce: &str) -> VaultResult<RekeyProgress> {
        let request = Request::new(Method::Put, "sys/rekey/update")
            .json(&serde_json::json!({ "key": key, "nonce": nonce }))?;
        let body = self.send_sys(request)?;

        let complete = body
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|obj| obj.contains_key("complete"));
        if complete {
            Ok(RekeyProgress::Complete(decode(body)?))
        } else {
            Ok(RekeyProgress::Pending(decode(body)?))
        }
    }
}

//! Command-line interface for vaultkv

pub mod args;
pub mod commands;
mod output;

pub use args::{Cli, Commands};

use crate::client::Client;
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::kv::Kv;
use std::time::Duration;

/// Server connection after flags, environment and config file are merged
#[derive(Debug, Clone)]
pub struct Connection {
    pub address: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl Connection {
    /// Flags and environment (already folded together by clap) win over the file
    pub fn resolve(address: Option<String>, token: Option<String>, vault: &VaultConfig) -> Self {
        Self {
            address: address.unwrap_or_else(|| vault.address.clone()),
            token: token.or_else(|| vault.token.clone()),
            timeout: vault.timeout(),
        }
    }

    /// Client without requiring a token, for unauthenticated endpoints
    pub fn client(&self) -> Client {
        Client::new(&self.address, self.token.clone(), self.timeout)
    }

    /// Key/value facade; fails early when no token is configured
    pub fn kv(&self) -> VaultResult<Kv> {
        if self.token.is_none() {
            return Err(VaultError::MissingToken);
        }
        Ok(Kv::new(self.client()))
    }
}

/// Run blocking client calls off the async runtime
pub(crate) async fn blocking<T, F>(f: F) -> VaultResult<T>
where
    F: FnOnce() -> VaultResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VaultError::Internal(format!("blocking task failed: {e}")))?
}

//! vaultkv - Vault key/value client
//!
//! Reads and writes secrets on KV version 1 and version 2 mounts through one
//! interface, detecting each mount's generation on first use. Sealed and
//! uninitialized servers are reported as distinct errors.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod kv;
pub mod rekey;
pub mod sys;
#[cfg(test)]
pub(crate) mod testing;

pub use client::Client;
pub use error::{VaultError, VaultResult};
pub use kv::Kv;

//! Error types for vaultkv
//!
//! All modules use `VaultResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vaultkv operations
pub type VaultResult<T> = Result<T, VaultError>;

/// All errors that can occur in vaultkv
#[derive(Error, Debug)]
pub enum VaultError {
    // Status-derived errors
    /// 400: validation failure, CAS mismatch, malformed input
    #[error("{}", describe("bad request", .0))]
    BadRequest(String),

    /// 403: token missing, expired, or lacking policy
    #[error("{}", describe("permission denied", .0))]
    Forbidden(String),

    /// 404: the path does not exist, or the server is hiding it
    #[error("{}", describe("not found", .0))]
    NotFound(String),

    /// 500
    #[error("{}", describe("internal server error", .0))]
    InternalServer(String),

    /// 503 with the server reporting itself sealed
    #[error("{}", describe("vault is sealed", .0))]
    Sealed(String),

    /// 503 (or 400 on sys endpoints) with the server reporting itself uninitialized
    #[error("{}", describe("vault is not initialized", .0))]
    Uninitialized(String),

    /// Any status without a dedicated kind
    #[error("{}", describe(&format!("unexpected status {}", .status), .message))]
    Generic { status: u16, message: String },

    // Network errors
    #[error("transport error: {0}")]
    Transport(String),

    // Backend generation errors
    #[error("{operation} is not supported on KV version {version} mounts")]
    KvUnsupported {
        operation: &'static str,
        version: u8,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No token configured")]
    MissingToken,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe(kind: &str, message: &str) -> String {
    if message.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}: {message}")
    }
}

impl VaultError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a KvUnsupported error for the given operation and generation
    pub fn unsupported(operation: &'static str, version: u8) -> Self {
        Self::KvUnsupported { operation, version }
    }

    /// Whether trying again later could succeed without the caller changing anything
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Sealed(_) | Self::Uninitialized(_) | Self::Transport(_)
        )
    }

    /// Whether the error means the requested thing is not present
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Forbidden(_) => Some("Check that your token is valid: vaultkv login"),
            Self::Sealed(_) => Some("Unseal the vault before retrying"),
            Self::Uninitialized(_) => Some("Initialize the vault before retrying"),
            Self::Transport(_) => Some("Check the vault address (VAULT_ADDR) and that the server is up"),
            Self::MissingToken => Some("Set VAULT_TOKEN or run: vaultkv login"),
            Self::KvUnsupported { version: 1, .. } => {
                Some("Version history requires a KV version 2 mount")
            }
            _ => None,
        }
    }
}

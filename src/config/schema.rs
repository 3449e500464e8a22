//! Configuration schema for vaultkv
//!
//! Configuration is stored at `~/.config/vaultkv/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Server connection
    pub vault: VaultConfig,

    /// Login defaults
    pub auth: AuthConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Server address, without the `/v1` prefix
    pub address: String,

    /// Client token; VAULT_TOKEN takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

/// Auth method used by `vaultkv login`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Token,
    Userpass,
    Ldap,
    Github,
}

impl std::str::FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(Self::Token),
            "userpass" => Ok(Self::Userpass),
            "ldap" => Ok(Self::Ldap),
            "github" => Ok(Self::Github),
            other => Err(format!(
                "unknown auth method '{other}' (expected token, userpass, ldap or github)"
            )),
        }
    }
}

/// Login defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Default method for `vaultkv login`
    pub method: AuthMethod,

    /// Default username for userpass and ldap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

//! Configuration management for vaultkv

pub mod schema;

pub use schema::{AuthConfig, AuthMethod, Config, GeneralConfig, VaultConfig};

use crate::error::{VaultError, VaultResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes the vaultkv config file
///
/// The default location is `<config dir>/vaultkv/config.toml`; `--config`
/// or `VAULTKV_CONFIG` point it elsewhere.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed config; a missing file yields the defaults
    pub async fn load(&self) -> VaultResult<Config> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(VaultError::io(
                    format!("reading config from {}", self.path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| VaultError::ConfigInvalid {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, creating the parent directory
    ///
    /// The file may hold a token, so on unix it is written owner-only.
    pub async fn save(&self, config: &Config) -> VaultResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| VaultError::io(format!("writing config to {}", self.path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| VaultError::io("restricting config file permissions", e))?;
        }

        info!("Saved {}", self.path.display());
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(dir.join("vaultkv").join("config.toml"))
    }
}

impl VaultConfig {
    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

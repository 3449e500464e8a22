//! Mount generation resolution
//!
//! The first path segment names a mount. Which KV generation lives there is
//! asked of the server once and remembered for the life of the resolver.

use crate::client::{Client, Method, Request};
use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// KV backend generation mounted at a path prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Generation {
    /// Flat overwrite semantics, no history
    V1,
    /// Versioned history with soft-delete and destroy
    V2,
}

impl Generation {
    /// Numeric generation as the server reports it
    pub fn number(self) -> u8 {
        match self {
            Generation::V1 => 1,
            Generation::V2 => 2,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Split a logical path into its mount and a subpath with exactly one
/// leading slash: `"secret//a/b"` becomes `("secret", "/a/b")`.
pub fn split_mount(path: &str) -> (String, String) {
    let path = path.trim_start_matches('/');
    let (mount, rest) = path.split_once('/').unwrap_or((path, ""));
    (
        mount.to_string(),
        format!("/{}", rest.trim_start_matches('/')),
    )
}

#[derive(Debug, Default, Deserialize)]
struct MountInfo {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    options: Option<MountOptions>,
}

#[derive(Debug, Default, Deserialize)]
struct MountOptions {
    #[serde(default)]
    version: Option<Value>,
}

/// Probe response; newer servers nest the mount under `data`
#[derive(Debug, Default, Deserialize)]
struct MountProbe {
    #[serde(default)]
    data: Option<MountInfo>,
    #[serde(flatten)]
    top: MountInfo,
}

impl MountInfo {
    fn generation(&self) -> Generation {
        if self.kind.as_deref() != Some("kv") {
            return Generation::V1;
        }

        let version = self
            .options
            .as_ref()
            .and_then(|o| o.version.as_ref())
            .and_then(|v| match v {
                Value::String(s) => s.trim().parse::<u64>().ok(),
                Value::Number(n) => n.as_u64(),
                _ => None,
            });

        match version {
            Some(2) => Generation::V2,
            _ => Generation::V1,
        }
    }
}

/// Ask the server which generation is mounted at `mount`
///
/// A 404 means either no such mount or a server too old to have the
/// introspection endpoint; both are treated as V1.
pub fn probe_generation(client: &Client, mount: &str) -> VaultResult<Generation> {
    let request = Request::new(
        Method::Get,
        format!("sys/internal/ui/mounts/{}", mount.trim_start_matches('/')),
    );

    let probe: MountProbe = match client.send_json(request) {
        Ok(probe) => probe,
        Err(VaultError::NotFound(_)) => {
            debug!("Mount probe for {} returned 404, assuming KV v1", mount);
            return Ok(Generation::V1);
        }
        Err(e) => return Err(e),
    };

    let info = probe.data.as_ref().unwrap_or(&probe.top);
    Ok(info.generation())
}

/// Memoizing mount resolver
///
/// Hits take the read lock; a miss takes the write lock for the whole
/// probe-then-insert sequence so concurrent misses on one mount probe once.
#[derive(Debug, Default)]
pub struct MountResolver {
    cache: RwLock<HashMap<String, Generation>>,
}

impl MountResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Generation>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Generation>> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve the generation for the mount that `path` lives under
    pub fn resolve(&self, client: &Client, path: &str) -> VaultResult<Generation> {
        let (mount, _) = split_mount(path);
        if mount.is_empty() {
            return Err(VaultError::InvalidArgument(format!(
                "path '{}' does not name a mount",
                path
            )));
        }

        if let Some(generation) = self.cached(&mount) {
            debug!("Mount {} cached as KV v{}", mount, generation);
            return Ok(generation);
        }

        let mut cache = self.write();
        if let Some(generation) = cache.get(&mount) {
            return Ok(*generation);
        }

        let generation = probe_generation(client, &mount)?;
        info!("Mount {} resolved to KV v{}", mount, generation);
        cache.insert(mount, generation);
        Ok(generation)
    }

    /// Cached generation for a mount, without probing
    pub fn cached(&self, mount: &str) -> Option<Generation> {
        self.read().get(mount.trim_matches('/')).copied()
    }

    /// Drop the cached generation for one mount
    ///
    /// Needed after an operator remounts or upgrades the backend.
    pub fn forget(&self, mount: &str) {
        self.write().remove(mount.trim_matches('/'));
    }

    /// Drop every cached generation
    pub fn forget_all(&self) {
        self.write().clear();
    }
}

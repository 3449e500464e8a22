//! KV version 1: unversioned primitives and the v1 adapter

use super::{KvBackend, KvSetOpts, KvVersion};
use crate::client::{Client, Method, Request};
use crate::error::{VaultError, VaultResult};
use crate::kv::mount::{split_mount, Generation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<String>,
}

impl Client {
    /// Read the secret at `path`, decoding its `data` payload into `T`
    ///
    /// Returns `Ok(None)` when the secret exists but holds null.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> VaultResult<Option<T>> {
        let envelope: DataEnvelope<T> = self.send_json(Request::new(Method::Get, path))?;
        Ok(envelope.data)
    }

    /// Check that a secret exists without decoding it
    pub fn exists(&self, path: &str) -> VaultResult<()> {
        self.send(Request::new(Method::Get, path)).map(|_| ())
    }

    /// List the keys directly under `path`; folders end in `/`
    pub fn list(&self, path: &str) -> VaultResult<Vec<String>> {
        let envelope: DataEnvelope<KeyList> = self.send_json(Request::new(Method::List, path))?;
        Ok(envelope.data.map(|d| d.keys).unwrap_or_default())
    }

    /// Overwrite the secret at `path`
    pub fn set<T: Serialize + ?Sized>(&self, path: &str, values: &T) -> VaultResult<()> {
        self.send(Request::new(Method::Put, path).json(values)?)
            .map(|_| ())
    }

    /// Remove the secret at `path`
    pub fn delete(&self, path: &str) -> VaultResult<()> {
        self.send(Request::new(Method::Delete, path)).map(|_| ())
    }
}

/// Adapter presenting a v1 mount through the versioned interface
pub struct KvV1<'a> {
    client: &'a Client,
}

impl<'a> KvV1<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn only_version() -> KvVersion {
        KvVersion {
            version: 1,
            deleted: false,
            destroyed: false,
        }
    }
}

impl KvBackend for KvV1<'_> {
    fn get(&self, path: &str, version: u64) -> VaultResult<(Option<Value>, KvVersion)> {
        if version > 1 {
            return Err(VaultError::NotFound(format!(
                "version {} of {} does not exist on a KV v1 mount",
                version, path
            )));
        }

        let data = self.client.get::<Value>(path)?;
        Ok((data, Self::only_version()))
    }

    fn set(&self, path: &str, values: &Value, opts: &KvSetOpts) -> VaultResult<KvVersion> {
        if let Some(cas) = opts.cas {
            warn!("Ignoring check-and-set ({}) for {}: KV v1 has no versions", cas, path);
        }

        self.client.set(path, values)?;
        Ok(Self::only_version())
    }

    fn delete(&self, path: &str, _versions: &[u64]) -> VaultResult<()> {
        self.client.delete(path)
    }

    fn undelete(&self, _path: &str, _versions: &[u64]) -> VaultResult<()> {
        Err(VaultError::unsupported("undelete", 1))
    }

    fn destroy(&self, path: &str, _versions: &[u64]) -> VaultResult<()> {
        self.client.delete(path)
    }

    fn destroy_all(&self, path: &str) -> VaultResult<()> {
        self.client.delete(path)
    }

    fn versions(&self, path: &str) -> VaultResult<Vec<KvVersion>> {
        self.client.exists(path)?;
        Ok(vec![Self::only_version()])
    }

    fn list(&self, path: &str) -> VaultResult<Vec<String>> {
        let (mount, subpath) = split_mount(path);
        self.client.list(&format!("{mount}{subpath}"))
    }

    fn mount_version(&self) -> Generation {
        Generation::V1
    }
}

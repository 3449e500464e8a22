//! Generation-agnostic key/value access
//!
//! [`Kv`] is the entry point. Each call resolves the mount at the front of
//! the path to a [`Generation`], then forwards to the matching
//! [`KvBackend`]: [`KvV1`] for flat mounts, [`KvV2`] for versioned ones.

pub mod mount;
mod v1;
mod v2;

pub use mount::{probe_generation, split_mount, Generation, MountResolver};
pub use v1::KvV1;
pub use v2::{KvV2, V2Metadata, V2Version};

use crate::client::{decode, Client};
use crate::error::{VaultError, VaultResult};
use crate::sys::Mount;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Version descriptor shared by both generations
///
/// On v1 mounts this is always version 1, neither deleted nor destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KvVersion {
    pub version: u64,
    pub deleted: bool,
    pub destroyed: bool,
}

/// Options for reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KvGetOpts {
    /// Version to read; 0 means latest
    pub version: u64,
}

/// Options for writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KvSetOpts {
    /// Check-and-set: `Some(0)` writes only if the key does not exist,
    /// `Some(n)` only if the current version is `n`. `None` disables the check.
    /// KV v1 mounts ignore it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas: Option<u64>,
}

impl KvSetOpts {
    /// Options with check-and-set enabled at `version`
    pub fn cas(version: u64) -> Self {
        Self {
            cas: Some(version),
        }
    }
}

/// Operations every KV generation provides
///
/// Payloads cross this boundary as JSON values; [`Kv`] handles typed
/// (de)serialization so the trait stays object safe.
pub trait KvBackend {
    /// Read `version` (0 = latest) of the secret at `path`
    fn get(&self, path: &str, version: u64) -> VaultResult<(Option<Value>, KvVersion)>;

    /// Write the secret at `path`
    fn set(&self, path: &str, values: &Value, opts: &KvSetOpts) -> VaultResult<KvVersion>;

    /// Soft-delete the given versions, or the latest when empty
    fn delete(&self, path: &str, versions: &[u64]) -> VaultResult<()>;

    /// Reverse a soft-delete
    fn undelete(&self, path: &str, versions: &[u64]) -> VaultResult<()>;

    /// Irrevocably remove the data of the given versions
    fn destroy(&self, path: &str, versions: &[u64]) -> VaultResult<()>;

    /// Remove the secret and all of its history
    fn destroy_all(&self, path: &str) -> VaultResult<()>;

    /// All known versions, ascending
    fn versions(&self, path: &str) -> VaultResult<Vec<KvVersion>>;

    /// Keys directly beneath `path`
    fn list(&self, path: &str) -> VaultResult<Vec<String>>;

    /// Generation this backend speaks
    fn mount_version(&self) -> Generation;
}

/// Decode an optional payload, treating JSON null as absent
pub(crate) fn decode_payload<T: DeserializeOwned>(data: Option<Value>) -> VaultResult<Option<T>> {
    match data {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(decode(Some(value))?)),
    }
}

/// Key/value facade over mounts of either generation
#[derive(Debug)]
pub struct Kv {
    client: Client,
    mounts: MountResolver,
}

impl Kv {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            mounts: MountResolver::new(),
        }
    }

    /// Underlying API client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Mutable access to the client, e.g. to swap the token after login
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Mount resolver and its cache
    pub fn mounts(&self) -> &MountResolver {
        &self.mounts
    }

    fn dispatch<R>(
        &self,
        path: &str,
        op: impl FnOnce(&dyn KvBackend) -> VaultResult<R>,
    ) -> VaultResult<R> {
        match self.mounts.resolve(&self.client, path)? {
            Generation::V1 => op(&KvV1::new(&self.client)),
            Generation::V2 => op(&KvV2::new(&self.client)),
        }
    }

    /// Generation mounted under `path`
    pub fn mount_version(&self, path: &str) -> VaultResult<Generation> {
        self.dispatch(path, |backend| Ok(backend.mount_version()))
    }

    /// Forget the cached generation for `mount`
    pub fn forget(&self, mount: &str) {
        debug!("Forgetting cached generation for {}", mount);
        self.mounts.forget(mount);
    }

    /// Forget every cached generation
    pub fn forget_all(&self) {
        self.mounts.forget_all();
    }

    /// Read a secret, decoding its payload into `T`
    ///
    /// A payload stored as null yields `None`.
    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&KvGetOpts>,
    ) -> VaultResult<(Option<T>, KvVersion)> {
        let version = opts.map(|o| o.version).unwrap_or(0);
        let (data, meta) = self.dispatch(path, |backend| backend.get(path, version))?;
        Ok((decode_payload(data)?, meta))
    }

    /// Check that the latest version of a secret is readable
    pub fn exists(&self, path: &str) -> VaultResult<KvVersion> {
        self.dispatch(path, |backend| backend.get(path, 0))
            .map(|(_, meta)| meta)
    }

    /// Write a secret
    pub fn set<T: Serialize + ?Sized>(
        &self,
        path: &str,
        values: &T,
        opts: Option<&KvSetOpts>,
    ) -> VaultResult<KvVersion> {
        let values = serde_json::to_value(values)?;
        let opts = opts.copied().unwrap_or_default();
        self.dispatch(path, |backend| backend.set(path, &values, &opts))
    }

    /// Soft-delete versions (latest when `versions` is empty)
    ///
    /// On v1 mounts this removes the secret outright.
    pub fn delete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.dispatch(path, |backend| backend.delete(path, versions))
    }

    /// Undo soft-deletes; fails with KvUnsupported on v1 mounts
    pub fn undelete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.dispatch(path, |backend| backend.undelete(path, versions))
    }

    /// Irrevocably erase the data of the given versions
    pub fn destroy(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.dispatch(path, |backend| backend.destroy(path, versions))
    }

    /// Remove a secret and its entire history
    pub fn destroy_all(&self, path: &str) -> VaultResult<()> {
        self.dispatch(path, |backend| backend.destroy_all(path))
    }

    /// Every known version of a secret, ascending
    pub fn versions(&self, path: &str) -> VaultResult<Vec<KvVersion>> {
        self.dispatch(path, |backend| backend.versions(path))
    }

    /// Keys directly beneath `path`
    pub fn list(&self, path: &str) -> VaultResult<Vec<String>> {
        self.dispatch(path, |backend| backend.list(path))
    }

    /// Mount a secrets engine, dropping any stale cached generation for it
    pub fn enable_secrets_mount(&self, path: &str, mount: &Mount) -> VaultResult<()> {
        self.client.enable_secrets_mount(path, mount)?;
        self.forget(&split_mount(path).0);
        Ok(())
    }

    /// Unmount a secrets engine and forget its cached generation
    pub fn disable_secrets_mount(&self, path: &str) -> VaultResult<()> {
        self.client.disable_secrets_mount(path)?;
        self.forget(&split_mount(path).0);
        Ok(())
    }

    /// Full version history; only v2 mounts keep one
    pub fn metadata(&self, path: &str) -> VaultResult<V2Metadata> {
        match self.mounts.resolve(&self.client, path)? {
            Generation::V1 => Err(VaultError::unsupported("metadata", 1)),
            Generation::V2 => self.client.v2_get_metadata(path),
        }
    }
}

//! KV version 2: versioned client calls and the v2 adapter
//!
//! Every v2 call rewrites the logical path `mount/sub` by inserting an
//! operation segment after the mount: `mount/data/sub`, `mount/metadata/sub`
//! and so on.

use super::{decode_payload, KvBackend, KvGetOpts, KvSetOpts, KvVersion};
use crate::client::{Client, Method, Request};
use crate::error::VaultResult;
use crate::kv::mount::{split_mount, Generation};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Information about one version of a v2 secret
///
/// `deleted_at` is `None` for versions that are not soft-deleted. A deleted
/// version can be undeleted; a destroyed one has lost its data for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct V2Version {
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub destroyed: bool,
    pub version: u64,
}

impl From<&V2Version> for KvVersion {
    fn from(v: &V2Version) -> Self {
        KvVersion {
            version: v.version,
            deleted: v.deleted_at.is_some(),
            destroyed: v.destroyed,
        }
    }
}

/// Version history for a v2 secret, versions sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct V2Metadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_version: u64,
    pub oldest_version: u64,
    pub max_versions: u64,
    pub versions: Vec<V2Version>,
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Default, Deserialize)]
struct VersionWire {
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    deletion_time: Option<String>,
    #[serde(default)]
    destroyed: bool,
    #[serde(default)]
    version: u64,
}

impl VersionWire {
    fn parse(&self) -> V2Version {
        V2Version {
            created_at: parse_time(self.created_time.as_deref()).unwrap_or_default(),
            deleted_at: parse_time(self.deletion_time.as_deref()),
            destroyed: self.destroyed,
            version: self.version,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MetadataWire {
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    updated_time: Option<String>,
    #[serde(default)]
    current_version: u64,
    #[serde(default)]
    oldest_version: u64,
    #[serde(default)]
    max_versions: u64,
    #[serde(default)]
    versions: HashMap<String, VersionWire>,
}

impl MetadataWire {
    fn parse(&self) -> V2Metadata {
        let mut versions: Vec<V2Version> = self
            .versions
            .iter()
            .filter_map(|(number, wire)| match number.parse::<u64>() {
                Ok(n) => Some(V2Version {
                    version: n,
                    ..wire.parse()
                }),
                Err(_) => {
                    debug!("Skipping version with non-numeric key {}", number);
                    None
                }
            })
            .collect();
        versions.sort_by_key(|v| v.version);

        V2Metadata {
            created_at: parse_time(self.created_time.as_deref()).unwrap_or_default(),
            updated_at: parse_time(self.updated_time.as_deref()).unwrap_or_default(),
            current_version: self.current_version,
            oldest_version: self.oldest_version,
            max_versions: self.max_versions,
            versions,
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ReadWire {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    metadata: VersionWire,
}

#[derive(Serialize)]
struct WriteWire<'a, T: ?Sized> {
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a KvSetOpts>,
    data: &'a T,
}

#[derive(Serialize)]
struct VersionList<'a> {
    versions: &'a [u64],
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<String>,
}

/// Insert `segment` between the mount and the rest of `path`
fn v2_path(path: &str, segment: &str) -> String {
    let (mount, subpath) = split_mount(path);
    format!("{mount}/{segment}{subpath}")
}

impl Client {
    /// Read a version of a v2 secret; latest unless `opts` names one
    ///
    /// A version written with null data yields `None`.
    pub fn v2_get<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&KvGetOpts>,
    ) -> VaultResult<(Option<T>, V2Version)> {
        let mut request = Request::new(Method::Get, v2_path(path, "data"));
        if let Some(version) = opts.map(|o| o.version).filter(|v| *v != 0) {
            request = request.query("version", version.to_string());
        }

        let envelope: Envelope<ReadWire> = self.send_json(request)?;
        let data = decode_payload(envelope.data.data)?;
        Ok((data, envelope.data.metadata.parse()))
    }

    /// Write a new version of a v2 secret
    pub fn v2_set<T: Serialize + ?Sized>(
        &self,
        path: &str,
        values: &T,
        opts: Option<&KvSetOpts>,
    ) -> VaultResult<V2Version> {
        let body = WriteWire {
            options: opts.filter(|o| o.cas.is_some()),
            data: values,
        };
        let request = Request::new(Method::Put, v2_path(path, "data")).json(&body)?;

        let envelope: Envelope<VersionWire> = self.send_json(request)?;
        Ok(envelope.data.parse())
    }

    /// Soft-delete versions; with no versions, the latest one
    pub fn v2_delete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        let request = if versions.is_empty() {
            Request::new(Method::Delete, v2_path(path, "data"))
        } else {
            Request::new(Method::Post, v2_path(path, "delete")).json(&VersionList { versions })?
        };
        self.send(request).map(|_| ())
    }

    /// Clear the deletion marker on the given versions
    pub fn v2_undelete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        let request =
            Request::new(Method::Post, v2_path(path, "undelete")).json(&VersionList { versions })?;
        self.send(request).map(|_| ())
    }

    /// Irrevocably erase the data of the given versions, keeping their metadata
    pub fn v2_destroy(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        let request =
            Request::new(Method::Post, v2_path(path, "destroy")).json(&VersionList { versions })?;
        self.send(request).map(|_| ())
    }

    /// Remove the secret's metadata and every version
    pub fn v2_destroy_metadata(&self, path: &str) -> VaultResult<()> {
        self.send(Request::new(Method::Delete, v2_path(path, "metadata")))
            .map(|_| ())
    }

    /// Read the secret's version history
    pub fn v2_get_metadata(&self, path: &str) -> VaultResult<V2Metadata> {
        let envelope: Envelope<MetadataWire> =
            self.send_json(Request::new(Method::Get, v2_path(path, "metadata")))?;
        Ok(envelope.data.parse())
    }

    /// List keys under a v2 path
    pub fn v2_list(&self, path: &str) -> VaultResult<Vec<String>> {
        let envelope: Envelope<KeyList> =
            self.send_json(Request::new(Method::List, v2_path(path, "metadata")))?;
        Ok(envelope.data.keys)
    }
}

/// Adapter presenting a v2 mount through the versioned interface
pub struct KvV2<'a> {
    client: &'a Client,
}

impl<'a> KvV2<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl KvBackend for KvV2<'_> {
    fn get(&self, path: &str, version: u64) -> VaultResult<(Option<Value>, KvVersion)> {
        let (data, meta) = self.client.v2_get(path, Some(&KvGetOpts { version }))?;
        Ok((data, KvVersion::from(&meta)))
    }

    fn set(&self, path: &str, values: &Value, opts: &KvSetOpts) -> VaultResult<KvVersion> {
        let meta = self.client.v2_set(path, values, Some(opts))?;
        Ok(KvVersion::from(&meta))
    }

    fn delete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.client.v2_delete(path, versions)
    }

    fn undelete(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.client.v2_undelete(path, versions)
    }

    fn destroy(&self, path: &str, versions: &[u64]) -> VaultResult<()> {
        self.client.v2_destroy(path, versions)
    }

    fn destroy_all(&self, path: &str) -> VaultResult<()> {
        self.client.v2_destroy_metadata(path)
    }

    fn versions(&self, path: &str) -> VaultResult<Vec<KvVersion>> {
        let meta = self.client.v2_get_metadata(path)?;
        Ok(meta.versions.iter().map(KvVersion::from).collect())
    }

    fn list(&self, path: &str) -> VaultResult<Vec<String>> {
        self.client.v2_list(path)
    }

    fn mount_version(&self) -> Generation {
        Generation::V2
    }
}

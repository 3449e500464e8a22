//! In-memory server for unit tests
//!
//! Implements [`Transport`] by emulating the subset of server behaviour the
//! client depends on: init and seal state, mount introspection, KV v1, KV v2
//! version history, sys mounts, rekey and login. Every request is recorded so
//! tests can count round trips.

use crate::client::{Method, Request, Response, Transport};
use crate::error::{VaultError, VaultResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// The single unseal key the fake accepts
pub const UNSEAL_KEY: &str = "unseal-key";

/// Root token handed out by a fresh init
pub const ROOT_TOKEN: &str = "s.root";

#[derive(Debug, Clone)]
struct Mount {
    kind: String,
    version: Option<String>,
}

#[derive(Debug, Clone)]
struct Version {
    data: Value,
    created_time: String,
    deletion_time: String,
    destroyed: bool,
}

impl Version {
    fn metadata(&self, number: u64) -> Value {
        json!({
            "created_time": self.created_time,
            "deletion_time": self.deletion_time,
            "destroyed": self.destroyed,
            "version": number,
        })
    }

    fn readable(&self) -> bool {
        self.deletion_time.is_empty() && !self.destroyed
    }
}

#[derive(Debug, Clone, Default)]
struct Secret {
    versions: BTreeMap<u64, Version>,
    current: u64,
    created_time: String,
    updated_time: String,
}

#[derive(Debug, Clone)]
struct Rekey {
    nonce: String,
    progress: u32,
    shares: u32,
    threshold: u32,
}

#[derive(Debug)]
struct State {
    initialized: bool,
    sealed: bool,
    connected: bool,
    legacy_mounts: bool,
    unseal_threshold: u32,
    unseal_progress: u32,
    required_token: Option<String>,
    mounts: BTreeMap<String, Mount>,
    kv1: BTreeMap<String, Value>,
    kv2: BTreeMap<String, BTreeMap<String, Secret>>,
    users: BTreeMap<String, String>,
    rekey: Option<Rekey>,
    fail_next: Option<(u16, String)>,
    fail_all: Option<(u16, String)>,
    requests: Vec<Request>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            initialized: true,
            sealed: false,
            connected: true,
            legacy_mounts: false,
            unseal_threshold: 1,
            unseal_progress: 0,
            required_token: None,
            mounts: BTreeMap::new(),
            kv1: BTreeMap::new(),
            kv2: BTreeMap::new(),
            users: BTreeMap::new(),
            rekey: None,
            fail_next: None,
            fail_all: None,
            requests: Vec::new(),
        }
    }
}

/// Shared handle to an emulated server
#[derive(Debug, Clone, Default)]
pub struct FakeVault {
    state: Arc<Mutex<State>>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ok(body: Value) -> Response {
    Response {
        status: 200,
        body: Some(body),
    }
}

fn no_content() -> Response {
    Response {
        status: 204,
        body: None,
    }
}

fn error(status: u16, message: &str) -> Response {
    let errors: Vec<&str> = if message.is_empty() {
        vec![]
    } else {
        vec![message]
    };
    Response {
        status,
        body: Some(json!({ "errors": errors })),
    }
}

fn field<'a>(request: &'a Request, key: &str) -> Option<&'a Value> {
    request.body.as_ref().and_then(|b| b.get(key))
}

fn versions_of(request: &Request) -> Vec<u64> {
    field(request, "versions")
        .and_then(Value::as_array)
        .map(|v| v.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default()
}

fn is_list(request: &Request) -> bool {
    request.method == Method::List || request.query_value("list") == Some("true")
}

/// Immediate children of `prefix` among `keys`, folders suffixed with `/`
fn list_children<'a>(keys: impl Iterator<Item = &'a String>, prefix: &str) -> BTreeSet<String> {
    let prefix = prefix.trim_matches('/');
    let prefix = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    };

    keys.filter_map(|k| k.strip_prefix(&prefix))
        .filter(|rest| !rest.is_empty())
        .map(|rest| match rest.find('/') {
            Some(i) => rest[..=i].to_string(),
            None => rest.to_string(),
        })
        .collect()
}

fn list_response(keys: BTreeSet<String>) -> Response {
    if keys.is_empty() {
        return error(404, "");
    }
    ok(json!({ "data": { "keys": keys } }))
}

impl FakeVault {
    /// An initialized, unsealed server with no mounts
    pub fn new() -> Self {
        Self::default()
    }

    /// A server that has never been initialized
    pub fn uninitialized() -> Self {
        let vault = Self::new();
        {
            let mut state = vault.lock();
            state.initialized = false;
            state.sealed = true;
        }
        vault
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attach a KV mount of the given generation
    pub fn with_kv_mount(self, name: &str, version: u8) -> Self {
        self.with_mount(name, "kv", Some(&version.to_string()))
    }

    /// Attach a mount with an arbitrary type and version option
    pub fn with_mount(self, name: &str, kind: &str, version: Option<&str>) -> Self {
        self.lock().mounts.insert(
            name.to_string(),
            Mount {
                kind: kind.to_string(),
                version: version.map(str::to_string),
            },
        );
        self
    }

    /// Emulate a server that predates mount introspection (404 on probe)
    pub fn with_legacy_mounts(self) -> Self {
        self.lock().legacy_mounts = true;
        self
    }

    /// Register a userpass/ldap user
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Reject data-path requests that do not carry this token
    pub fn with_required_token(self, token: &str) -> Self {
        self.lock().required_token = Some(token.to_string());
        self
    }

    /// Number of key shares needed to unseal or rekey
    pub fn with_unseal_threshold(self, threshold: u32) -> Self {
        self.lock().unseal_threshold = threshold;
        self
    }

    /// Change the generation reported for an existing mount
    pub fn remount(&self, name: &str, version: u8) {
        if let Some(mount) = self.lock().mounts.get_mut(name) {
            mount.version = Some(version.to_string());
        }
    }

    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Make every following request fail at the network level
    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    /// Answer the next request with the given status
    pub fn fail_next(&self, status: u16, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    /// Answer every following request with the given status
    pub fn fail_all(&self, status: u16, message: &str) {
        self.lock().fail_all = Some((status, message.to_string()));
    }

    /// Total requests received
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Requests received whose path starts with `prefix`
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.lock().requests.last().cloned()
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    fn route(state: &mut State, request: &Request) -> Response {
        let path = request.path.trim_end_matches('/').to_string();
        let method = request.method;

        if path == "sys/init" {
            return Self::init(state, request);
        }

        if !state.initialized {
            return match path.as_str() {
                "sys/seal-status" | "sys/unseal" | "sys/rekey/init" => {
                    error(400, "server is not yet initialized")
                }
                "sys/health" => Response {
                    status: 501,
                    body: Some(json!({"initialized": false, "sealed": true})),
                },
                _ => error(503, "Vault is sealed"),
            };
        }

        match (method, path.as_str()) {
            (Method::Get, "sys/seal-status") => return ok(Self::seal_state(state)),
            (Method::Put, "sys/unseal") => return Self::unseal(state, request),
            (Method::Get, "sys/health") => {
                let status = if state.sealed { 503 } else { 200 };
                return Response {
                    status,
                    body: Some(json!({
                        "initialized": true,
                        "sealed": state.sealed,
                        "standby": false,
                        "version": "1.15.0",
                    })),
                };
            }
            _ => {}
        }

        if state.sealed {
            return error(503, "Vault is sealed");
        }

        if let Some(required) = &state.required_token {
            let protected = !path.starts_with("auth/") && path != "sys/seal";
            if protected && request.token.as_deref() != Some(required.as_str()) {
                return error(403, "permission denied");
            }
        }

        if path == "sys/seal" && method == Method::Put {
            state.sealed = true;
            return no_content();
        }
        if let Some(mount) = path.strip_prefix("sys/internal/ui/mounts/") {
            return Self::describe_mount(state, mount);
        }
        if let Some(mount) = path.strip_prefix("sys/mounts/") {
            return Self::manage_mount(state, request, mount);
        }
        if path.starts_with("sys/rekey/") {
            return Self::rekey(state, request, &path);
        }
        if let Some(rest) = path.strip_prefix("auth/") {
            return Self::login(state, request, rest);
        }

        let (mount, rest) = match path.split_once('/') {
            Some((m, r)) => (m.to_string(), r.to_string()),
            None => (path.clone(), String::new()),
        };

        match state.mounts.get(&mount).cloned() {
            Some(m) if m.kind == "kv" && m.version.as_deref() == Some("2") => {
                Self::kv2(state, request, &mount, &rest)
            }
            Some(_) => Self::kv1(state, request, &path, &mount),
            None => error(404, &format!("no handler for route '{path}'")),
        }
    }

    fn init(state: &mut State, request: &Request) -> Response {
        match request.method {
            Method::Get => ok(json!({ "initialized": state.initialized })),
            _ if state.initialized => error(400, "Vault is already initialized"),
            _ => {
                let shares = field(request, "secret_shares")
                    .and_then(Value::as_u64)
                    .unwrap_or(1);
                state.initialized = true;
                state.sealed = true;
                let keys: Vec<&str> = (0..shares).map(|_| UNSEAL_KEY).collect();
                ok(json!({
                    "keys": keys,
                    "keys_base64": keys,
                    "root_token": ROOT_TOKEN,
                }))
            }
        }
    }

    fn seal_state(state: &State) -> Value {
        json!({
            "type": "shamir",
            "sealed": state.sealed,
            "t": state.unseal_threshold,
            "n": state.unseal_threshold,
            "progress": state.unseal_progress,
            "nonce": "",
            "version": "1.15.0",
        })
    }

    fn unseal(state: &mut State, request: &Request) -> Response {
        if field(request, "key").and_then(Value::as_str) != Some(UNSEAL_KEY) {
            return error(400, "invalid key");
        }
        state.unseal_progress += 1;
        if state.unseal_progress >= state.unseal_threshold {
            state.unseal_progress = 0;
            state.sealed = false;
        }
        ok(Self::seal_state(state))
    }

    fn describe_mount(state: &State, mount: &str) -> Response {
        if state.legacy_mounts {
            return error(404, "");
        }
        match state.mounts.get(mount) {
            Some(m) => ok(json!({
                "data": {
                    "type": m.kind,
                    "path": format!("{mount}/"),
                    "options": m.version.as_ref().map(|v| json!({ "version": v })),
                }
            })),
            None => error(404, &format!("no mount found at {mount}")),
        }
    }

    fn manage_mount(state: &mut State, request: &Request, mount: &str) -> Response {
        match request.method {
            Method::Post => {
                if state.mounts.contains_key(mount) {
                    return error(400, &format!("path is already in use at {mount}/"));
                }
                let kind = field(request, "type")
                    .and_then(Value::as_str)
                    .unwrap_or("kv")
                    .to_string();
                let version = field(request, "options")
                    .and_then(|o| o.get("version"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                state
                    .mounts
                    .insert(mount.to_string(), Mount { kind, version });
                no_content()
            }
            Method::Delete => {
                state.mounts.remove(mount);
                state.kv2.remove(mount);
                let prefix = format!("{mount}/");
                state.kv1.retain(|k, _| !k.starts_with(&prefix));
                no_content()
            }
            _ => error(405, "unsupported operation"),
        }
    }

    fn rekey(state: &mut State, request: &Request, path: &str) -> Response {
        match (request.method, path) {
            (Method::Get, "sys/rekey/init") => match &state.rekey {
                Some(r) => ok(json!({
                    "started": true,
                    "nonce": r.nonce,
                    "t": r.threshold,
                    "n": r.shares,
                    "progress": r.progress,
                    "required": state.unseal_threshold,
                    "pgp_fingerprints": null,
                    "backup": false,
                })),
                None => ok(json!({
                    "started": false,
                    "nonce": "",
                    "t": 0,
                    "n": 0,
                    "progress": 0,
                    "required": state.unseal_threshold,
                    "backup": false,
                })),
            },
            (Method::Put, "sys/rekey/init") => {
                if state.rekey.is_some() {
                    return error(400, "rekey already in progress");
                }
                let shares = field(request, "secret_shares")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as u32;
                let threshold = field(request, "secret_threshold")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as u32;
                state.rekey = Some(Rekey {
                    nonce: "rekey-nonce".to_string(),
                    progress: 0,
                    shares,
                    threshold,
                });
                no_content()
            }
            (Method::Delete, "sys/rekey/init") => {
                state.rekey = None;
                no_content()
            }
            (Method::Put, "sys/rekey/update") => {
                let required = state.unseal_threshold;
                let Some(rekey) = state.rekey.as_mut() else {
                    return error(400, "no rekey in progress");
                };
                if field(request, "nonce").and_then(Value::as_str) != Some(rekey.nonce.as_str()) {
                    return error(400, "incorrect nonce");
                }
                if field(request, "key").and_then(Value::as_str) != Some(UNSEAL_KEY) {
                    return error(400, "invalid key");
                }
                rekey.progress += 1;
                if rekey.progress < required {
                    return ok(json!({
                        "started": true,
                        "nonce": rekey.nonce,
                        "t": rekey.threshold,
                        "n": rekey.shares,
                        "progress": rekey.progress,
                        "required": required,
                        "backup": false,
                    }));
                }
                let keys: Vec<&str> = (0..rekey.shares).map(|_| UNSEAL_KEY).collect();
                state.rekey = None;
                ok(json!({
                    "complete": true,
                    "keys": keys,
                    "keys_base64": keys,
                    "backup": false,
                }))
            }
            _ => error(405, "unsupported operation"),
        }
    }

    fn login(state: &State, request: &Request, rest: &str) -> Response {
        let username = match rest.split('/').collect::<Vec<_>>().as_slice() {
            ["userpass" | "ldap", "login", user] => {
                let password = field(request, "password").and_then(Value::as_str);
                if state.users.get(*user).map(String::as_str) != password {
                    return error(400, "invalid username or password");
                }
                user.to_string()
            }
            ["github", "login"] => match field(request, "token").and_then(Value::as_str) {
                Some("gh-token") => "octocat".to_string(),
                _ => return error(400, "invalid github token"),
            },
            _ => return error(404, "no handler for route"),
        };

        ok(json!({
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "auth": {
                "client_token": format!("s.{username}"),
                "accessor": format!("accessor-{username}"),
                "policies": ["default"],
                "metadata": { "username": username },
                "lease_duration": 2764800,
                "renewable": true,
            }
        }))
    }

    fn kv1(state: &mut State, request: &Request, path: &str, mount: &str) -> Response {
        if is_list(request) {
            let prefix = path.strip_prefix(mount).unwrap_or("");
            let mount_prefix = format!("{mount}/");
            let keys: Vec<String> = state
                .kv1
                .keys()
                .filter_map(|k| k.strip_prefix(&mount_prefix).map(str::to_string))
                .collect();
            return list_response(list_children(keys.iter(), prefix));
        }

        match request.method {
            Method::Get => match state.kv1.get(path) {
                Some(v) => ok(json!({ "data": v })),
                None => error(404, ""),
            },
            Method::Put | Method::Post => {
                let value = request.body.clone().unwrap_or(Value::Null);
                state.kv1.insert(path.to_string(), value);
                no_content()
            }
            Method::Delete => {
                state.kv1.remove(path);
                no_content()
            }
            Method::List => error(405, "unsupported operation"),
        }
    }

    fn kv2(state: &mut State, request: &Request, mount: &str, rest: &str) -> Response {
        let (op, key) = match rest.split_once('/') {
            Some((op, key)) => (op, key.to_string()),
            None => (rest, String::new()),
        };
        let secrets = state.kv2.entry(mount.to_string()).or_default();

        match (op, request.method) {
            ("metadata", _) if is_list(request) => list_response(list_children(
                secrets.keys(),
                &key,
            )),
            ("data", Method::Get) => {
                let Some(secret) = secrets.get(&key) else {
                    return error(404, "");
                };
                let number = request
                    .query_value("version")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|v| *v != 0)
                    .unwrap_or(secret.current);
                match secret.versions.get(&number) {
                    Some(v) if v.readable() => ok(json!({
                        "data": { "data": v.data, "metadata": v.metadata(number) }
                    })),
                    Some(v) => Response {
                        status: 404,
                        body: Some(json!({
                            "data": { "data": null, "metadata": v.metadata(number) }
                        })),
                    },
                    None => error(404, ""),
                }
            }
            ("data", Method::Put | Method::Post) => {
                let current = secrets.get(&key).map(|s| s.current).unwrap_or(0);
                let cas = field(request, "options")
                    .and_then(|o| o.get("cas"))
                    .and_then(Value::as_u64);
                if let Some(cas) = cas {
                    if cas != current {
                        return error(
                            400,
                            "check-and-set parameter did not match the current version",
                        );
                    }
                }

                let stamp = now();
                let secret = secrets.entry(key).or_insert_with(|| Secret {
                    created_time: stamp.clone(),
                    ..Secret::default()
                });
                secret.current += 1;
                secret.updated_time = stamp.clone();
                let version = Version {
                    data: field(request, "data").cloned().unwrap_or(Value::Null),
                    created_time: stamp,
                    deletion_time: String::new(),
                    destroyed: false,
                };
                let metadata = version.metadata(secret.current);
                secret.versions.insert(secret.current, version);
                ok(json!({ "data": metadata }))
            }
            ("data", Method::Delete) => {
                if let Some(secret) = secrets.get_mut(&key) {
                    let current = secret.current;
                    if let Some(v) = secret.versions.get_mut(&current) {
                        if v.deletion_time.is_empty() {
                            v.deletion_time = now();
                        }
                    }
                }
                no_content()
            }
            ("delete" | "undelete" | "destroy", Method::Post | Method::Put) => {
                let versions = versions_of(request);
                if let Some(secret) = secrets.get_mut(&key) {
                    for number in versions {
                        let Some(v) = secret.versions.get_mut(&number) else {
                            continue;
                        };
                        match op {
                            "delete" if v.deletion_time.is_empty() && !v.destroyed => {
                                v.deletion_time = now()
                            }
                            "undelete" if !v.destroyed => v.deletion_time.clear(),
                            "destroy" => {
                                v.destroyed = true;
                                v.data = Value::Null;
                            }
                            _ => {}
                        }
                    }
                }
                no_content()
            }
            ("metadata", Method::Get) => match secrets.get(&key) {
                Some(secret) => {
                    let versions: BTreeMap<String, Value> = secret
                        .versions
                        .iter()
                        .map(|(n, v)| (n.to_string(), v.metadata(*n)))
                        .collect();
                    ok(json!({
                        "data": {
                            "created_time": secret.created_time,
                            "updated_time": secret.updated_time,
                            "current_version": secret.current,
                            "oldest_version": secret.versions.keys().next().copied().unwrap_or(0),
                            "max_versions": 0,
                            "versions": versions,
                        }
                    }))
                }
                None => error(404, ""),
            },
            ("metadata", Method::Delete) => {
                secrets.remove(&key);
                no_content()
            }
            _ => error(405, "unsupported operation"),
        }
    }
}

impl Transport for FakeVault {
    fn execute(&self, request: &Request) -> VaultResult<Response> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if !state.connected {
            return Err(VaultError::Transport("connection refused".to_string()));
        }
        if let Some((status, message)) = state.fail_all.clone() {
            return Ok(error(status, &message));
        }
        if let Some((status, message)) = state.fail_next.take() {
            return Ok(error(status, &message));
        }

        Ok(Self::route(&mut state, request))
    }
}

//! In-memory stand-in for the lakeFS auth API.
//!
//! Implements [`Transport`] directly, so lifecycle tests run without a
//! server. Behaviour follows lakeFS where the controllers depend on it:
//! 404 for unknown objects, idempotent edge PUTs, the secret returned only
//! on credential creation, and member/policy listings paged by `after`.
//! Policy statements are echoed with object keys reordered so tests can tell
//! the caller's text from the server's.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lakefs_rbac::{ApiPath, ClientError, Provider, Transport};
use serde_json::{Value, json};

const EPOCH: i64 = 1_700_000_000;

#[derive(Debug, Default)]
struct Store {
    clock: i64,
    users: BTreeMap<String, i64>,
    groups: BTreeMap<String, (Option<String>, i64)>,
    policies: BTreeMap<String, (Value, i64)>,
    credentials: BTreeMap<String, (String, i64)>,
    members: BTreeSet<(String, String)>,
    group_policies: BTreeSet<(String, String)>,
    user_policies: BTreeSet<(String, String)>,
    requests: Vec<String>,
    next_key: u32,
    fail_posts: bool,
}

impl Store {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        EPOCH + self.clock
    }
}

/// Fake lakeFS auth service.
#[derive(Debug, Clone)]
pub struct FakeLakeFs {
    store: Arc<Mutex<Store>>,
    page_size: usize,
}

impl Default for FakeLakeFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLakeFs {
    pub fn new() -> Self {
        Self {
            store: Arc::default(),
            page_size: 100,
        }
    }

    /// Lists at most `page_size` entries per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn provider(&self) -> Provider {
        Provider::from_transport(Arc::new(self.clone()))
    }

    pub fn has_user(&self, id: &str) -> bool {
        self.store.lock().unwrap().users.contains_key(id)
    }

    pub fn has_group(&self, id: &str) -> bool {
        self.store.lock().unwrap().groups.contains_key(id)
    }

    pub fn has_member(&self, group: &str, user: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .members
            .contains(&(group.to_string(), user.to_string()))
    }

    pub fn has_credentials(&self, access_key_id: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .credentials
            .contains_key(access_key_id)
    }

    pub fn group_description(&self, id: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .groups
            .get(id)
            .and_then(|(d, _)| d.clone())
    }

    /// Deletes a user behind the controllers' back.
    pub fn drop_user(&self, id: &str) {
        let mut store = self.store.lock().unwrap();
        store.users.remove(id);
        store.members.retain(|(_, u)| u != id);
        store.user_policies.retain(|(u, _)| u != id);
        store.credentials.retain(|_, (u, _)| u.as_str() != id);
    }

    /// Adds members directly, e.g. to fill several list pages.
    pub fn seed_members(&self, group: &str, users: &[&str]) {
        let mut store = self.store.lock().unwrap();
        let created = store.tick();
        store.groups.entry(group.to_string()).or_insert((None, created));
        for user in users {
            store.users.entry(user.to_string()).or_insert(created);
            store.members.insert((group.to_string(), user.to_string()));
        }
    }

    /// Sets a policy statement behind the controllers' back.
    pub fn set_statement(&self, id: &str, statement: Value) {
        let mut store = self.store.lock().unwrap();
        if let Some(entry) = store.policies.get_mut(id) {
            entry.0 = statement;
        }
    }

    /// Makes every later POST fail with a 500 until switched off.
    pub fn fail_posts(&self, fail: bool) {
        self.store.lock().unwrap().fail_posts = fail;
    }

    /// Every request seen so far, as `METHOD /path`.
    pub fn requests(&self) -> Vec<String> {
        self.store.lock().unwrap().requests.clone()
    }

    fn handle(&self, method: &str, path: &ApiPath, body: Option<&str>) -> Result<String, ClientError> {
        let mut store = self.store.lock().unwrap();
        store.requests.push(format!("{method} {path}"));
        if method == "POST" && store.fail_posts {
            return Err(ClientError::http(500, "boom"));
        }

        let segments: Vec<&str> = path.segments().iter().map(String::as_str).collect();
        let after = path
            .query()
            .iter()
            .find(|(k, _)| k == "after")
            .map(|(_, v)| v.clone());
        let body: Value = match body {
            Some(text) => serde_json::from_str(text)
                .map_err(|e| ClientError::http(400, format!("bad body: {e}")))?,
            None => Value::Null,
        };
        let not_found = || ClientError::not_found(path.to_string());

        let response = match (method, segments.as_slice()) {
            ("POST", ["auth", "users"]) => {
                let id = str_field(&body, "id")?;
                if store.users.contains_key(&id) {
                    return Err(ClientError::http(409, "user already exists"));
                }
                let created = store.tick();
                store.users.insert(id.clone(), created);
                json!({"id": id, "creation_date": created, "friendly_name": ""})
            }
            ("GET", ["auth", "users", id]) => {
                let created = *store.users.get(*id).ok_or_else(not_found)?;
                json!({"id": id, "creation_date": created})
            }
            ("DELETE", ["auth", "users", id]) => {
                store.users.remove(*id).ok_or_else(not_found)?;
                let id = id.to_string();
                store.members.retain(|(_, u)| *u != id);
                store.user_policies.retain(|(u, _)| *u != id);
                store.credentials.retain(|_, (u, _)| *u != id);
                Value::Null
            }

            ("POST", ["auth", "groups"]) => {
                let id = str_field(&body, "id")?;
                if store.groups.contains_key(&id) {
                    return Err(ClientError::http(409, "group already exists"));
                }
                let description = body
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let created = store.tick();
                store.groups.insert(id.clone(), (description.clone(), created));
                json!({"id": id, "description": description.unwrap_or_default(), "creation_date": created})
            }
            ("GET", ["auth", "groups", id]) => {
                let (description, created) = store.groups.get(*id).ok_or_else(not_found)?;
                json!({"id": id, "description": description.clone().unwrap_or_default(), "creation_date": created})
            }
            ("DELETE", ["auth", "groups", id]) => {
                store.groups.remove(*id).ok_or_else(not_found)?;
                let id = id.to_string();
                store.members.retain(|(g, _)| *g != id);
                store.group_policies.retain(|(g, _)| *g != id);
                Value::Null
            }

            ("POST", ["auth", "policies"]) => {
                let id = str_field(&body, "id")?;
                if store.policies.contains_key(&id) {
                    return Err(ClientError::http(409, "policy already exists"));
                }
                let statement = body.get("statement").cloned().unwrap_or(Value::Null);
                let created = store.tick();
                store.policies.insert(id.clone(), (statement.clone(), created));
                return Ok(policy_body(&id, &statement, created));
            }
            ("GET", ["auth", "policies", id]) => {
                let (statement, created) = store.policies.get(*id).ok_or_else(not_found)?;
                return Ok(policy_body(id, statement, *created));
            }
            ("PUT", ["auth", "policies", id]) => {
                let statement = body.get("statement").cloned().unwrap_or(Value::Null);
                let entry = store.policies.get_mut(*id).ok_or_else(not_found)?;
                entry.0 = statement;
                return Ok(policy_body(id, &entry.0, entry.1));
            }
            ("DELETE", ["auth", "policies", id]) => {
                store.policies.remove(*id).ok_or_else(not_found)?;
                let id = id.to_string();
                store.group_policies.retain(|(_, p)| *p != id);
                store.user_policies.retain(|(_, p)| *p != id);
                Value::Null
            }

            ("POST", ["auth", "users", user, "credentials"]) => {
                if !store.users.contains_key(*user) {
                    return Err(not_found());
                }
                store.next_key += 1;
                let key = format!("AKIAFAKE{:04}", store.next_key);
                let created = store.tick();
                store
                    .credentials
                    .insert(key.clone(), (user.to_string(), created));
                json!({
                    "access_key_id": key,
                    "secret_access_key": format!("secret-{key}"),
                    "creation_date": created,
                })
            }
            ("GET", ["auth", "users", user, "credentials", key]) => {
                match store.credentials.get(*key) {
                    Some((owner, created)) if owner.as_str() == *user => {
                        json!({"access_key_id": key, "creation_date": created})
                    }
                    _ => return Err(not_found()),
                }
            }
            ("DELETE", ["auth", "users", user, "credentials", key]) => {
                match store.credentials.get(*key) {
                    Some((owner, _)) if owner.as_str() == *user => {
                        store.credentials.remove(*key);
                        Value::Null
                    }
                    _ => return Err(not_found()),
                }
            }

            ("GET", ["auth", "groups", group, "members"]) => {
                if !store.groups.contains_key(*group) {
                    return Err(not_found());
                }
                let ids = edge_targets(&store.members, group);
                self.page(&ids, after.as_deref())
            }
            ("PUT", ["auth", "groups", group, "members", user]) => {
                if !store.groups.contains_key(*group) || !store.users.contains_key(*user) {
                    return Err(not_found());
                }
                store.members.insert((group.to_string(), user.to_string()));
                Value::Null
            }
            ("DELETE", ["auth", "groups", group, "members", user]) => {
                if !store.members.remove(&(group.to_string(), user.to_string())) {
                    return Err(not_found());
                }
                Value::Null
            }

            ("GET", ["auth", "groups", group, "policies", policy]) => {
                if !store
                    .group_policies
                    .contains(&(group.to_string(), policy.to_string()))
                {
                    return Err(not_found());
                }
                let (statement, created) = store.policies.get(*policy).ok_or_else(not_found)?;
                return Ok(policy_body(policy, statement, *created));
            }
            ("PUT", ["auth", "groups", group, "policies", policy]) => {
                if !store.groups.contains_key(*group) || !store.policies.contains_key(*policy) {
                    return Err(not_found());
                }
                store
                    .group_policies
                    .insert((group.to_string(), policy.to_string()));
                Value::Null
            }
            ("DELETE", ["auth", "groups", group, "policies", policy]) => {
                if !store
                    .group_policies
                    .remove(&(group.to_string(), policy.to_string()))
                {
                    return Err(not_found());
                }
                Value::Null
            }

            ("GET", ["auth", "users", user, "policies"]) => {
                if !store.users.contains_key(*user) {
                    return Err(not_found());
                }
                let ids = edge_targets(&store.user_policies, user);
                self.page(&ids, after.as_deref())
            }
            ("PUT", ["auth", "users", user, "policies", policy]) => {
                if !store.users.contains_key(*user) || !store.policies.contains_key(*policy) {
                    return Err(not_found());
                }
                store
                    .user_policies
                    .insert((user.to_string(), policy.to_string()));
                Value::Null
            }
            ("DELETE", ["auth", "users", user, "policies", policy]) => {
                if !store
                    .user_policies
                    .remove(&(user.to_string(), policy.to_string()))
                {
                    return Err(not_found());
                }
                Value::Null
            }

            _ => return Err(ClientError::http(405, format!("{method} {path} not supported"))),
        };

        Ok(match response {
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    fn page(&self, ids: &[String], after: Option<&str>) -> Value {
        let remaining: Vec<&String> = ids
            .iter()
            .filter(|id| after.is_none_or(|a| id.as_str() > a))
            .collect();
        let has_more = remaining.len() > self.page_size;
        let page: Vec<&String> = remaining.into_iter().take(self.page_size).collect();
        let next_offset = if has_more {
            page.last().map(|id| id.to_string()).unwrap_or_default()
        } else {
            String::new()
        };
        json!({
            "results": page.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "pagination": {
                "has_more": has_more,
                "next_offset": next_offset,
                "results": page.len(),
                "max_per_page": self.page_size,
            },
        })
    }
}

#[async_trait]
impl Transport for FakeLakeFs {
    async fn get(&self, path: &ApiPath) -> Result<String, ClientError> {
        self.handle("GET", path, None)
    }

    async fn post(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError> {
        self.handle("POST", path, body.as_deref())
    }

    async fn put(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError> {
        self.handle("PUT", path, body.as_deref())
    }

    async fn delete(&self, path: &ApiPath) -> Result<(), ClientError> {
        self.handle("DELETE", path, None).map(|_| ())
    }
}

fn str_field(body: &Value, field: &str) -> Result<String, ClientError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::http(400, format!("missing {field}")))
}

fn edge_targets(edges: &BTreeSet<(String, String)>, owner: &str) -> Vec<String> {
    edges
        .iter()
        .filter(|(o, _)| o == owner)
        .map(|(_, t)| t.clone())
        .collect()
}

fn policy_body(id: &str, statement: &Value, created: i64) -> String {
    format!(
        r#"{{"creation_date":{created},"statement":{},"id":{}}}"#,
        reversed(statement),
        Value::from(id)
    )
}

/// Renders JSON with object keys in descending order and spaces after
/// separators, so the text differs from a compact caller-supplied form.
pub fn reversed(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| b.cmp(a));
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}: {}", Value::from(k.as_str()), reversed(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(reversed).collect();
            format!("[{}]", items.join(", "))
        }
        scalar => scalar.to_string(),
    }
}

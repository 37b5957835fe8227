//! Read-only lookups of existing users, groups and policies.
//!
//! These back references to objects managed elsewhere. Unlike a resource
//! Read, a missing object is an error: the caller named something that has
//! to exist.

use tokio_util::sync::CancellationToken;

use crate::classify::escalate;
use crate::error::{ResourceError, ResourceResult};
use crate::model::{Group, Policy, User};
use crate::resources::{
    EntityKind, GroupKind, GroupResponse, PolicyResponse, UserKind, UserResponse, group_path,
    policy_path, user_path,
};
use crate::transport::ApiClient;

/// Lookups bound to a client.
#[derive(Debug, Clone)]
pub struct DataSources {
    client: ApiClient,
}

impl DataSources {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Looks up a user by ID.
    pub async fn lookup_user(&self, cancel: &CancellationToken, id: &str) -> ResourceResult<User> {
        let response: UserResponse = escalate(self.client.get(cancel, &user_path(id)).await, || {
            format!("read user {id}")
        })?;
        let mut user = User::new(id);
        UserKind::apply(&mut user, response);
        Ok(user)
    }

    /// Looks up a group by ID.
    pub async fn lookup_group(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ResourceResult<Group> {
        let response: GroupResponse =
            escalate(self.client.get(cancel, &group_path(id)).await, || {
                format!("read group {id}")
            })?;
        let mut group = Group::new(id);
        GroupKind::apply(&mut group, response);
        Ok(group)
    }

    /// Looks up a policy by ID. The statement is the server's text, compacted.
    pub async fn lookup_policy(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ResourceResult<Policy> {
        let response: PolicyResponse =
            escalate(self.client.get(cancel, &policy_path(id)).await, || {
                format!("read policy {id}")
            })?;
        Ok(Policy {
            statement: statement_text(&response.statement)?,
            id: response.id,
            creation_date: Some(response.creation_date),
        })
    }
}

fn statement_text(raw: &serde_json::value::RawValue) -> ResourceResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(raw.get()).map_err(ResourceError::MarshalStatement)?;
    serde_json::to_string(&value).map_err(ResourceError::MarshalStatement)
}

//! Policies.
//!
//! The statement is sent as raw JSON and read back as raw JSON text. After
//! every create, read and update the caller's text is kept if it still means
//! the same as the server copy, see [`crate::statement`].

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::entity::EntityKind;
use super::require_import_id;
use crate::error::{ResourceError, ResourceResult};
use crate::model::{Policy, ResourceKind};
use crate::statement;
use crate::transport::ApiPath;

/// Hooks for [`Policy`].
#[derive(Debug, Clone, Copy)]
pub struct PolicyKind;

#[derive(Debug, Serialize)]
pub struct PolicyRequest {
    id: String,
    statement: Box<RawValue>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyResponse {
    pub(crate) id: String,
    pub(crate) creation_date: i64,
    pub(crate) statement: Box<RawValue>,
}

pub(crate) fn policy_path(id: &str) -> ApiPath {
    ApiPath::auth().join("policies").join(id)
}

fn request(desired: &Policy) -> ResourceResult<PolicyRequest> {
    let statement =
        RawValue::from_string(desired.statement.clone()).map_err(ResourceError::InvalidStatement)?;
    Ok(PolicyRequest {
        id: desired.id.clone(),
        statement,
    })
}

impl EntityKind for PolicyKind {
    type State = Policy;
    type Request = PolicyRequest;
    type Response = PolicyResponse;

    const KIND: ResourceKind = ResourceKind::Policy;

    fn describe(state: &Policy) -> String {
        format!("policy {}", state.id)
    }

    fn create_path(_desired: &Policy) -> ApiPath {
        ApiPath::auth().join("policies")
    }

    fn create_body(desired: &Policy) -> ResourceResult<Option<PolicyRequest>> {
        request(desired).map(Some)
    }

    fn object_path(state: &Policy) -> ResourceResult<ApiPath> {
        Ok(policy_path(&state.id))
    }

    fn update_body(desired: &Policy) -> ResourceResult<Option<PolicyRequest>> {
        request(desired).map(Some)
    }

    fn apply(state: &mut Policy, response: PolicyResponse) {
        state.id = response.id;
        state.creation_date = Some(response.creation_date);
        state.statement = statement::normalize(&state.statement, response.statement.get());
    }

    fn import(id: &str) -> ResourceResult<Policy> {
        Ok(Policy::new(require_import_id(id, "<policy_id>")?, ""))
    }
}

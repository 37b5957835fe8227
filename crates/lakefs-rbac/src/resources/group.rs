//! Groups.
//!
//! `description` can only be set at creation; changing it replaces the group.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::require_import_id;
use crate::error::ResourceResult;
use crate::model::{Group, ResourceKind};
use crate::transport::ApiPath;

/// Hooks for [`Group`].
#[derive(Debug, Clone, Copy)]
pub struct GroupKind;

#[derive(Debug, Serialize)]
pub struct GroupCreateRequest {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupResponse {
    id: String,
    creation_date: i64,
    #[serde(default)]
    description: Option<String>,
}

pub(crate) fn group_path(id: &str) -> ApiPath {
    ApiPath::auth().join("groups").join(id)
}

impl EntityKind for GroupKind {
    type State = Group;
    type Request = GroupCreateRequest;
    type Response = GroupResponse;

    const KIND: ResourceKind = ResourceKind::Group;

    fn describe(state: &Group) -> String {
        format!("group {}", state.id)
    }

    fn create_path(_desired: &Group) -> ApiPath {
        ApiPath::auth().join("groups")
    }

    fn create_body(desired: &Group) -> ResourceResult<Option<GroupCreateRequest>> {
        Ok(Some(GroupCreateRequest {
            id: desired.id.clone(),
            description: desired.description.clone(),
        }))
    }

    fn object_path(state: &Group) -> ResourceResult<ApiPath> {
        Ok(group_path(&state.id))
    }

    fn apply(state: &mut Group, response: GroupResponse) {
        state.id = response.id;
        state.creation_date = Some(response.creation_date);
        state.description = response.description.filter(|d| !d.is_empty());
    }

    fn import(id: &str) -> ResourceResult<Group> {
        Ok(Group::new(require_import_id(id, "<group_id>")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_description_is_not_sent() {
        let body = GroupKind::create_body(&Group::new("g1")).unwrap().unwrap();
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"id":"g1"}"#);

        let body = GroupKind::create_body(&Group::new("g1").with_description("readers"))
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"id":"g1","description":"readers"}"#
        );
    }

    #[test]
    fn test_response_without_description_unsets_it() {
        let mut state = Group::new("g1").with_description("stale");
        let response: GroupResponse =
            serde_json::from_str(r#"{"id":"g1","creation_date":42}"#).unwrap();
        GroupKind::apply(&mut state, response);
        assert_eq!(state.description, None);
        assert_eq!(state.creation_date, Some(42));
    }
}

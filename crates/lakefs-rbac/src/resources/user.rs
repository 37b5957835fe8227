//! Users.
//!
//! Only `id` is caller-supplied. `creation_date` and `friendly_name` are
//! computed by lakeFS, so there is nothing to update in place.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::require_import_id;
use crate::error::ResourceResult;
use crate::model::{ResourceKind, User};
use crate::transport::ApiPath;

/// Hooks for [`User`].
#[derive(Debug, Clone, Copy)]
pub struct UserKind;

#[derive(Debug, Serialize)]
pub struct UserCreateRequest {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    id: String,
    creation_date: i64,
    #[serde(default)]
    friendly_name: Option<String>,
}

pub(crate) fn user_path(id: &str) -> ApiPath {
    ApiPath::auth().join("users").join(id)
}

impl EntityKind for UserKind {
    type State = User;
    type Request = UserCreateRequest;
    type Response = UserResponse;

    const KIND: ResourceKind = ResourceKind::User;

    fn describe(state: &User) -> String {
        format!("user {}", state.id)
    }

    fn create_path(_desired: &User) -> ApiPath {
        ApiPath::auth().join("users")
    }

    fn create_body(desired: &User) -> ResourceResult<Option<UserCreateRequest>> {
        Ok(Some(UserCreateRequest {
            id: desired.id.clone(),
        }))
    }

    fn object_path(state: &User) -> ResourceResult<ApiPath> {
        Ok(user_path(&state.id))
    }

    fn apply(state: &mut User, response: UserResponse) {
        state.id = response.id;
        state.creation_date = Some(response.creation_date);
        state.friendly_name = response.friendly_name.filter(|name| !name.is_empty());
    }

    fn import(id: &str) -> ResourceResult<User> {
        Ok(User::new(require_import_id(id, "<user_id>")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_friendly_name_becomes_unset() {
        let mut state = User::new("u1");
        let response: UserResponse =
            serde_json::from_str(r#"{"id":"u1","creation_date":1700000000,"friendly_name":""}"#)
                .unwrap();
        UserKind::apply(&mut state, response);
        assert_eq!(state.creation_date, Some(1_700_000_000));
        assert_eq!(state.friendly_name, None);
    }

    #[test]
    fn test_friendly_name_is_adopted() {
        let mut state = User::new("u1");
        let response: UserResponse = serde_json::from_str(
            r#"{"id":"u1","creation_date":1,"friendly_name":"Ursula","email":"u@example.com"}"#,
        )
        .unwrap();
        UserKind::apply(&mut state, response);
        assert_eq!(state.friendly_name.as_deref(), Some("Ursula"));
    }

    #[test]
    fn test_create_body_carries_only_id() {
        let body = UserKind::create_body(&User::new("u1")).unwrap().unwrap();
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"id":"u1"}"#);
    }
}

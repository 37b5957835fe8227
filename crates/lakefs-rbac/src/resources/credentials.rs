//! User credentials.
//!
//! lakeFS generates both halves of the key pair. The access key ID becomes
//! the address of the credential; the secret is only present in the create
//! response and is carried forward from state afterwards.

use serde::Deserialize;

use super::entity::EntityKind;
use super::{require_import_id, split_import_id};
use crate::error::{ResourceError, ResourceResult};
use crate::model::{ResourceKind, UserCredentials};
use crate::transport::ApiPath;

const IMPORT_FORMAT: &str = "<user_id>:<access_key_id>";

/// Hooks for [`UserCredentials`].
#[derive(Debug, Clone, Copy)]
pub struct CredentialsKind;

#[derive(Debug, Deserialize)]
pub struct CredentialsResponse {
    access_key_id: String,
    #[serde(default)]
    secret_access_key: Option<String>,
    creation_date: i64,
}

fn credentials_path(user_id: &str) -> ApiPath {
    ApiPath::auth().join("users").join(user_id).join("credentials")
}

impl EntityKind for CredentialsKind {
    type State = UserCredentials;
    type Request = ();
    type Response = CredentialsResponse;

    const KIND: ResourceKind = ResourceKind::UserCredentials;

    fn describe(state: &UserCredentials) -> String {
        match &state.access_key_id {
            Some(key) => format!("credentials {key} for user {}", state.user_id),
            None => format!("credentials for user {}", state.user_id),
        }
    }

    fn create_path(desired: &UserCredentials) -> ApiPath {
        credentials_path(&desired.user_id)
    }

    fn create_body(_desired: &UserCredentials) -> ResourceResult<Option<()>> {
        Ok(None)
    }

    fn object_path(state: &UserCredentials) -> ResourceResult<ApiPath> {
        let key = state
            .access_key_id
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ResourceError::MissingIdentity {
                kind: "user_credentials",
                field: "access_key_id",
            })?;
        Ok(credentials_path(&state.user_id).join(key))
    }

    fn apply(state: &mut UserCredentials, response: CredentialsResponse) {
        state.access_key_id = Some(response.access_key_id);
        state.creation_date = Some(response.creation_date);
        if let Some(secret) = response.secret_access_key.filter(|s| !s.is_empty()) {
            state.secret_access_key = Some(secret);
        }
    }

    fn import(id: &str) -> ResourceResult<UserCredentials> {
        if let Ok((user_id, access_key_id)) = split_import_id(id, IMPORT_FORMAT) {
            return Ok(UserCredentials {
                user_id: user_id.to_string(),
                access_key_id: Some(access_key_id.to_string()),
                ..Default::default()
            });
        }
        let user_id = require_import_id(id, IMPORT_FORMAT)?;
        Ok(UserCredentials::new(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CredentialsResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_secret_is_kept_when_server_omits_it() {
        let mut state = UserCredentials::new("u1");
        CredentialsKind::apply(
            &mut state,
            response(r#"{"access_key_id":"AK1","secret_access_key":"s3cr3t","creation_date":1}"#),
        );
        assert_eq!(state.secret_access_key.as_deref(), Some("s3cr3t"));

        CredentialsKind::apply(
            &mut state,
            response(r#"{"access_key_id":"AK1","creation_date":1}"#),
        );
        assert_eq!(state.secret_access_key.as_deref(), Some("s3cr3t"));
        assert_eq!(state.access_key_id.as_deref(), Some("AK1"));
    }

    #[test]
    fn test_object_path_requires_access_key() {
        let err = CredentialsKind::object_path(&UserCredentials::new("u1")).unwrap_err();
        assert!(matches!(err, ResourceError::MissingIdentity { .. }));

        let state = CredentialsKind::import("u1:AK1").unwrap();
        assert_eq!(
            CredentialsKind::object_path(&state).unwrap().to_string(),
            "/auth/users/u1/credentials/AK1"
        );
    }

    #[test]
    fn test_import_accepts_bare_user_id() {
        let state = CredentialsKind::import("u1").unwrap();
        assert_eq!(state.user_id, "u1");
        assert_eq!(state.access_key_id, None);
        assert!(CredentialsKind::import("").is_err());
    }
}

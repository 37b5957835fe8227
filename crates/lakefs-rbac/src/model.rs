//! Resource state types.
//!
//! Each struct doubles as desired configuration and as persisted state:
//! server-computed fields are `None` until a Create or Read fills them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of resource kinds managed by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Group,
    Policy,
    UserCredentials,
    GroupMembership,
    GroupPolicyAttachment,
    UserPolicyAttachment,
}

impl ResourceKind {
    /// All kinds, entities first.
    pub const ALL: [ResourceKind; 7] = [
        Self::User,
        Self::Group,
        Self::Policy,
        Self::UserCredentials,
        Self::GroupMembership,
        Self::GroupPolicyAttachment,
        Self::UserPolicyAttachment,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Policy => "policy",
            Self::UserCredentials => "user_credentials",
            Self::GroupMembership => "group_membership",
            Self::GroupPolicyAttachment => "group_policy_attachment",
            Self::UserPolicyAttachment => "user_policy_attachment",
        }
    }

    /// Returns `true` for many-to-many edges without their own identity.
    #[must_use]
    pub fn is_edge(&self) -> bool {
        matches!(
            self,
            Self::GroupMembership | Self::GroupPolicyAttachment | Self::UserPolicyAttachment
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown resource kind: {s}"))
    }
}

/// A lakeFS user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// A lakeFS group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
}

impl Group {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A lakeFS policy. `statement` is JSON text, kept as written by the caller
/// for as long as the server copy means the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
}

impl Policy {
    #[must_use]
    pub fn new(id: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            creation_date: None,
        }
    }
}

/// An access key pair issued to a user.
///
/// The secret is only ever returned by the create call; it is carried
/// forward unchanged by every later Read.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
}

impl UserCredentials {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user_id", &self.user_id)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("creation_date", &self.creation_date)
            .finish()
    }
}

/// Membership of a user in a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
}

/// A policy attached to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicyAttachment {
    pub group_id: String,
    pub policy_id: String,
}

/// A policy attached directly to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPolicyAttachment {
    pub user_id: String,
    pub policy_id: String,
}

/// State of any managed resource, tagged by kind.
///
/// This is the shape persisted by callers that handle several kinds at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceState {
    User(User),
    Group(Group),
    Policy(Policy),
    UserCredentials(UserCredentials),
    GroupMembership(GroupMembership),
    GroupPolicyAttachment(GroupPolicyAttachment),
    UserPolicyAttachment(UserPolicyAttachment),
}

impl ResourceState {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::User(_) => ResourceKind::User,
            Self::Group(_) => ResourceKind::Group,
            Self::Policy(_) => ResourceKind::Policy,
            Self::UserCredentials(_) => ResourceKind::UserCredentials,
            Self::GroupMembership(_) => ResourceKind::GroupMembership,
            Self::GroupPolicyAttachment(_) => ResourceKind::GroupPolicyAttachment,
            Self::UserPolicyAttachment(_) => ResourceKind::UserPolicyAttachment,
        }
    }

    /// Identifier suitable for display and for a later import.
    #[must_use]
    pub fn import_id(&self) -> String {
        match self {
            Self::User(u) => u.id.clone(),
            Self::Group(g) => g.id.clone(),
            Self::Policy(p) => p.id.clone(),
            Self::UserCredentials(c) => match &c.access_key_id {
                Some(key) => format!("{}:{key}", c.user_id),
                None => c.user_id.clone(),
            },
            Self::GroupMembership(m) => format!("{}:{}", m.group_id, m.user_id),
            Self::GroupPolicyAttachment(a) => format!("{}:{}", a.group_id, a.policy_id),
            Self::UserPolicyAttachment(a) => format!("{}:{}", a.user_id, a.policy_id),
        }
    }
}

/// Conversion between a concrete state type and [`ResourceState`].
pub trait StateVariant: Sized {
    const KIND: ResourceKind;

    /// Borrows the concrete state if `state` is of this kind.
    fn from_state(state: &ResourceState) -> Option<&Self>;

    /// Wraps the concrete state.
    fn into_state(self) -> ResourceState;
}

macro_rules! state_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl StateVariant for $variant {
                const KIND: ResourceKind = ResourceKind::$variant;

                fn from_state(state: &ResourceState) -> Option<&Self> {
                    match state {
                        ResourceState::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_state(self) -> ResourceState {
                    ResourceState::$variant(self)
                }
            }

            impl From<$variant> for ResourceState {
                fn from(state: $variant) -> Self {
                    ResourceState::$variant(state)
                }
            }
        )*
    };
}

state_variant!(
    User,
    Group,
    Policy,
    UserCredentials,
    GroupMembership,
    GroupPolicyAttachment,
    UserPolicyAttachment,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("bucket".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_state_is_tagged_by_kind() {
        let state = ResourceState::GroupMembership(GroupMembership {
            group_id: "g1".into(),
            user_id: "u1".into(),
        });
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "group_membership", "group_id": "g1", "user_id": "u1"})
        );
        assert_eq!(state.import_id(), "g1:u1");
    }

    #[test]
    fn test_state_variant_matches_kind() {
        let state = User::new("u1").into_state();
        assert_eq!(state.kind(), <User as StateVariant>::KIND);
        assert!(User::from_state(&state).is_some());
        assert!(Group::from_state(&state).is_none());
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let json = serde_json::to_string(&User::new("u1")).unwrap();
        assert_eq!(json, r#"{"id":"u1"}"#);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = UserCredentials {
            user_id: "u1".into(),
            access_key_id: Some("AKIAEXAMPLE".into()),
            secret_access_key: Some("very-secret".into()),
            creation_date: Some(1),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKIAEXAMPLE"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

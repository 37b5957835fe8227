//! Resource controllers.
//!
//! Every kind implements the same [`Controller`] lifecycle. The control flow
//! lives in two generic controllers; a kind only contributes what differs:
//!
//! - [`EntityController`] drives kinds with their own identity
//!   ([`UserKind`], [`GroupKind`], [`PolicyKind`], [`CredentialsKind`]) through
//!   the [`EntityKind`] hooks.
//! - [`AttachmentController`] drives many-to-many edges
//!   ([`MembershipKind`], [`GroupPolicyKind`], [`UserPolicyKind`]) through the
//!   [`EdgeKind`] hooks.

mod attachment;
mod credentials;
mod edges;
mod entity;
mod group;
mod policy;
mod user;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{ResourceError, ResourceResult};
use crate::model::ResourceKind;
use crate::plan::Plannable;

pub use attachment::{AttachmentController, EdgeKind, EdgeRead};
pub use credentials::CredentialsKind;
pub use edges::{GroupPolicyKind, MembershipKind, UserPolicyKind};
pub use entity::{EntityController, EntityKind};
pub use group::GroupKind;
pub use policy::PolicyKind;
pub use user::UserKind;

pub(crate) use group::{GroupResponse, group_path};
pub(crate) use policy::{PolicyResponse, policy_path};
pub(crate) use user::{UserResponse, user_path};

/// Lifecycle of one managed resource instance.
///
/// Implementations hold no per-instance state; the caller owns the state and
/// passes it in. Each call is independent and may be cancelled through
/// `cancel`, in which case it fails without touching the state it was given.
#[async_trait]
pub trait Controller: Send + Sync {
    /// State type of the managed kind.
    type State: Plannable + Clone + Send + Sync + 'static;

    /// The kind managed by this controller.
    fn kind(&self) -> ResourceKind;

    /// Creates the remote object and returns the canonical state.
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: &Self::State,
    ) -> ResourceResult<Self::State>;

    /// Refreshes state from the remote side. `Ok(None)` means the object no
    /// longer exists and the record must be dropped.
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: &Self::State,
    ) -> ResourceResult<Option<Self::State>>;

    /// Applies in-place changes. Kinds without updatable fields return
    /// `prior` unchanged.
    async fn update(
        &self,
        cancel: &CancellationToken,
        desired: &Self::State,
        prior: &Self::State,
    ) -> ResourceResult<Self::State>;

    /// Deletes the remote object. A 404 is reported as an error.
    async fn delete(&self, cancel: &CancellationToken, state: &Self::State) -> ResourceResult<()>;

    /// Seeds state from an external identifier, to be hydrated by `read`.
    fn import(&self, id: &str) -> ResourceResult<Self::State>;
}

/// Lifecycle step, used to word diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Read,
    Update,
    Delete,
}

impl Op {
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Splits a composite `left:right` import identifier.
///
/// Both halves must be non-empty. Only the first `:` separates, so the right
/// half may itself contain colons.
pub(crate) fn split_import_id<'a>(
    id: &'a str,
    expected: &'static str,
) -> ResourceResult<(&'a str, &'a str)> {
    match id.split_once(':') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => Ok((left, right)),
        _ => Err(ResourceError::invalid_import_id(id, expected)),
    }
}

/// Rejects empty single-part identifiers.
pub(crate) fn require_import_id<'a>(
    id: &'a str,
    expected: &'static str,
) -> ResourceResult<&'a str> {
    if id.is_empty() {
        Err(ResourceError::invalid_import_id(id, expected))
    } else {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_import_id() {
        assert_eq!(split_import_id("g1:u1", "x").unwrap(), ("g1", "u1"));
        assert_eq!(
            split_import_id("u1:arn:lakefs:x", "x").unwrap(),
            ("u1", "arn:lakefs:x")
        );
        assert!(split_import_id("g1", "x").is_err());
        assert!(split_import_id(":u1", "x").is_err());
        assert!(split_import_id("g1:", "x").is_err());
    }

    #[test]
    fn test_require_import_id() {
        assert_eq!(require_import_id("u1", "x").unwrap(), "u1");
        assert!(require_import_id("", "x").is_err());
    }
}

//! Kind-erased entry point over all controllers.
//!
//! Callers that persist [`ResourceState`] records of mixed kinds go through
//! [`Provider`]; it routes each record to the controller for its kind.

use tokio_util::sync::CancellationToken;

use crate::data_source::DataSources;
use crate::error::{ResourceError, ResourceResult};
use crate::model::{ResourceKind, ResourceState, StateVariant};
use crate::plan::{self, Plan};
use crate::reconcile::{self, Outcome};
use crate::resources::{
    AttachmentController, Controller, CredentialsKind, EntityController, GroupKind,
    GroupPolicyKind, MembershipKind, PolicyKind, UserKind, UserPolicyKind,
};
use crate::transport::{ApiClient, DynTransport};

/// Every controller and data source, bound to one client.
#[derive(Debug, Clone)]
pub struct Provider {
    users: EntityController<UserKind>,
    groups: EntityController<GroupKind>,
    policies: EntityController<PolicyKind>,
    credentials: EntityController<CredentialsKind>,
    memberships: AttachmentController<MembershipKind>,
    group_policies: AttachmentController<GroupPolicyKind>,
    user_policies: AttachmentController<UserPolicyKind>,
    data_sources: DataSources,
}

macro_rules! dispatch {
    ($self:ident, $kind:expr, |$c:ident| $body:expr) => {
        match $kind {
            ResourceKind::User => {
                let $c = &$self.users;
                $body
            }
            ResourceKind::Group => {
                let $c = &$self.groups;
                $body
            }
            ResourceKind::Policy => {
                let $c = &$self.policies;
                $body
            }
            ResourceKind::UserCredentials => {
                let $c = &$self.credentials;
                $body
            }
            ResourceKind::GroupMembership => {
                let $c = &$self.memberships;
                $body
            }
            ResourceKind::GroupPolicyAttachment => {
                let $c = &$self.group_policies;
                $body
            }
            ResourceKind::UserPolicyAttachment => {
                let $c = &$self.user_policies;
                $body
            }
        }
    };
}

impl Provider {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            users: EntityController::new(client.clone()),
            groups: EntityController::new(client.clone()),
            policies: EntityController::new(client.clone()),
            credentials: EntityController::new(client.clone()),
            memberships: AttachmentController::new(client.clone()),
            group_policies: AttachmentController::new(client.clone()),
            user_policies: AttachmentController::new(client.clone()),
            data_sources: DataSources::new(client),
        }
    }

    #[must_use]
    pub fn from_transport(transport: DynTransport) -> Self {
        Self::new(ApiClient::new(transport))
    }

    pub fn users(&self) -> &EntityController<UserKind> {
        &self.users
    }

    pub fn groups(&self) -> &EntityController<GroupKind> {
        &self.groups
    }

    pub fn policies(&self) -> &EntityController<PolicyKind> {
        &self.policies
    }

    pub fn credentials(&self) -> &EntityController<CredentialsKind> {
        &self.credentials
    }

    pub fn memberships(&self) -> &AttachmentController<MembershipKind> {
        &self.memberships
    }

    pub fn group_policies(&self) -> &AttachmentController<GroupPolicyKind> {
        &self.group_policies
    }

    pub fn user_policies(&self) -> &AttachmentController<UserPolicyKind> {
        &self.user_policies
    }

    pub fn data_sources(&self) -> &DataSources {
        &self.data_sources
    }

    /// Seeds state of `kind` from an import identifier. The result still
    /// needs a [`read`](Self::read) to be hydrated.
    pub fn import(&self, kind: ResourceKind, id: &str) -> ResourceResult<ResourceState> {
        dispatch!(self, kind, |c| Ok(c.import(id)?.into_state()))
    }

    pub async fn create(
        &self,
        cancel: &CancellationToken,
        desired: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        dispatch!(self, desired.kind(), |c| create_with(c, cancel, desired).await)
    }

    /// Refreshes `state`; `Ok(None)` means the remote object is gone.
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        state: &ResourceState,
    ) -> ResourceResult<Option<ResourceState>> {
        dispatch!(self, state.kind(), |c| read_with(c, cancel, state).await)
    }

    pub async fn update(
        &self,
        cancel: &CancellationToken,
        desired: &ResourceState,
        prior: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        dispatch!(self, desired.kind(), |c| update_with(c, cancel, desired, prior)
            .await)
    }

    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        state: &ResourceState,
    ) -> ResourceResult<()> {
        dispatch!(self, state.kind(), |c| delete_with(c, cancel, state).await)
    }

    /// Plans without touching the remote side. `prior` is used as given.
    pub fn plan(
        &self,
        desired: Option<&ResourceState>,
        prior: Option<&ResourceState>,
    ) -> ResourceResult<Plan> {
        let Some(kind) = desired.or(prior).map(ResourceState::kind) else {
            return Ok(Plan::NoOp);
        };
        dispatch!(self, kind, |c| plan_with(c, desired, prior))
    }

    /// Refreshes `prior`, plans, and executes the plan.
    pub async fn reconcile(
        &self,
        cancel: &CancellationToken,
        desired: Option<&ResourceState>,
        prior: Option<&ResourceState>,
    ) -> ResourceResult<Outcome<ResourceState>> {
        let Some(kind) = desired.or(prior).map(ResourceState::kind) else {
            return Ok(Outcome {
                plan: Plan::NoOp,
                state: None,
            });
        };
        dispatch!(self, kind, |c| reconcile_with(c, cancel, desired, prior).await)
    }
}

fn concrete<S: StateVariant>(state: &ResourceState) -> ResourceResult<&S> {
    S::from_state(state).ok_or(ResourceError::KindMismatch {
        expected: S::KIND.as_str(),
        actual: state.kind().as_str(),
    })
}

fn concrete_opt<S: StateVariant>(state: Option<&ResourceState>) -> ResourceResult<Option<&S>> {
    state.map(concrete::<S>).transpose()
}

async fn create_with<C>(
    controller: &C,
    cancel: &CancellationToken,
    desired: &ResourceState,
) -> ResourceResult<ResourceState>
where
    C: Controller,
    C::State: StateVariant,
{
    let desired = concrete::<C::State>(desired)?;
    Ok(controller.create(cancel, desired).await?.into_state())
}

async fn read_with<C>(
    controller: &C,
    cancel: &CancellationToken,
    state: &ResourceState,
) -> ResourceResult<Option<ResourceState>>
where
    C: Controller,
    C::State: StateVariant,
{
    let state = concrete::<C::State>(state)?;
    Ok(controller
        .read(cancel, state)
        .await?
        .map(StateVariant::into_state))
}

async fn update_with<C>(
    controller: &C,
    cancel: &CancellationToken,
    desired: &ResourceState,
    prior: &ResourceState,
) -> ResourceResult<ResourceState>
where
    C: Controller,
    C::State: StateVariant,
{
    let desired = concrete::<C::State>(desired)?;
    let prior = concrete::<C::State>(prior)?;
    Ok(controller.update(cancel, desired, prior).await?.into_state())
}

async fn delete_with<C>(
    controller: &C,
    cancel: &CancellationToken,
    state: &ResourceState,
) -> ResourceResult<()>
where
    C: Controller,
    C::State: StateVariant,
{
    controller
        .delete(cancel, concrete::<C::State>(state)?)
        .await
}

fn plan_with<C>(
    _controller: &C,
    desired: Option<&ResourceState>,
    prior: Option<&ResourceState>,
) -> ResourceResult<Plan>
where
    C: Controller,
    C::State: StateVariant,
{
    let desired = concrete_opt::<C::State>(desired)?;
    let prior = concrete_opt::<C::State>(prior)?;
    Ok(plan::plan(desired, prior))
}

async fn reconcile_with<C>(
    controller: &C,
    cancel: &CancellationToken,
    desired: Option<&ResourceState>,
    prior: Option<&ResourceState>,
) -> ResourceResult<Outcome<ResourceState>>
where
    C: Controller,
    C::State: StateVariant,
{
    let desired = concrete_opt::<C::State>(desired)?;
    let prior = concrete_opt::<C::State>(prior)?;
    let outcome = reconcile::reconcile(controller, cancel, desired, prior).await?;
    Ok(Outcome {
        plan: outcome.plan,
        state: outcome.state.map(StateVariant::into_state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::error::ClientError;
    use crate::model::{Group, GroupMembership, User};
    use crate::transport::{ApiPath, Transport};

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn get(&self, path: &ApiPath) -> Result<String, ClientError> {
            Err(ClientError::Network(format!("unreachable: {path}")))
        }

        async fn post(&self, path: &ApiPath, _body: Option<String>) -> Result<String, ClientError> {
            Err(ClientError::Network(format!("unreachable: {path}")))
        }

        async fn put(&self, path: &ApiPath, _body: Option<String>) -> Result<String, ClientError> {
            Err(ClientError::Network(format!("unreachable: {path}")))
        }

        async fn delete(&self, path: &ApiPath) -> Result<(), ClientError> {
            Err(ClientError::Network(format!("unreachable: {path}")))
        }
    }

    fn provider() -> Provider {
        Provider::from_transport(Arc::new(Unreachable))
    }

    #[test]
    fn test_import_routes_by_kind() {
        let provider = provider();
        let state = provider
            .import(ResourceKind::GroupMembership, "g1:u1")
            .unwrap();
        assert_eq!(
            state,
            ResourceState::GroupMembership(GroupMembership {
                group_id: "g1".into(),
                user_id: "u1".into(),
            })
        );
        assert!(provider.import(ResourceKind::GroupMembership, "g1").is_err());
    }

    #[test]
    fn test_plan_rejects_mixed_kinds() {
        let desired = User::new("u1").into_state();
        let prior = Group::new("u1").into_state();
        let err = provider().plan(Some(&desired), Some(&prior)).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::KindMismatch {
                expected: "user",
                actual: "group"
            }
        ));
    }

    #[test]
    fn test_plan_nothing_is_noop() {
        assert_eq!(provider().plan(None, None).unwrap(), Plan::NoOp);
    }

    #[tokio::test]
    async fn test_reconcile_surfaces_transport_failure() {
        let cancel = CancellationToken::new();
        let desired = User::new("u1").into_state();
        let err = provider()
            .reconcile(&cancel, Some(&desired), None)
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Client Error");
        assert!(err.to_string().starts_with("Unable to create user u1"));
    }
}

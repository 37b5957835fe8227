//! Generic lifecycle for kinds with their own identity.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::{Controller, Op};
use crate::classify::{absent_on_not_found, escalate};
use crate::error::{ResourceError, ResourceResult};
use crate::model::ResourceKind;
use crate::plan::Plannable;
use crate::transport::{ApiClient, ApiPath};

/// Kind-specific hooks for [`EntityController`].
pub trait EntityKind: Send + Sync + 'static {
    /// Desired configuration and persisted state.
    type State: Plannable + Clone + Send + Sync + 'static;
    /// Body of the create (and, where supported, update) request.
    type Request: Serialize + Send + Sync;
    /// Body returned by create, read and update.
    type Response: DeserializeOwned + Send;

    const KIND: ResourceKind;

    /// Wording for diagnostics, e.g. `user u1`.
    fn describe(state: &Self::State) -> String;

    /// Where the create request is posted.
    fn create_path(desired: &Self::State) -> ApiPath;

    /// Create request body, `None` for an empty POST.
    fn create_body(desired: &Self::State) -> ResourceResult<Option<Self::Request>>;

    /// Address of an existing object, used by read, update and delete.
    fn object_path(state: &Self::State) -> ResourceResult<ApiPath>;

    /// In-place update body. `None` means the kind has no updatable fields
    /// and update is a no-op.
    fn update_body(_desired: &Self::State) -> ResourceResult<Option<Self::Request>> {
        Ok(None)
    }

    /// Folds a server response into `state`.
    fn apply(state: &mut Self::State, response: Self::Response);

    /// Seeds state from an import identifier.
    fn import(id: &str) -> ResourceResult<Self::State>;
}

/// Controller for an [`EntityKind`], bound to its transport at construction.
pub struct EntityController<K> {
    client: ApiClient,
    _kind: PhantomData<fn() -> K>,
}

impl<K: EntityKind> EntityController<K> {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K> Clone for EntityController<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: EntityKind> fmt::Debug for EntityController<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityController")
            .field("kind", &K::KIND)
            .finish_non_exhaustive()
    }
}

fn action<K: EntityKind>(op: Op, state: &K::State) -> String {
    format!("{} {}", op.verb(), K::describe(state))
}

#[async_trait]
impl<K: EntityKind> Controller for EntityController<K> {
    type State = K::State;

    fn kind(&self) -> ResourceKind {
        K::KIND
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: &K::State,
    ) -> ResourceResult<K::State> {
        let path = K::create_path(desired);
        let body = K::create_body(desired)?;
        let response: K::Response = self
            .client
            .post(cancel, &path, body.as_ref())
            .await
            .map_err(|e| ResourceError::client(action::<K>(Op::Create, desired), e))?;

        let mut state = desired.clone();
        K::apply(&mut state, response);
        tracing::debug!(kind = %K::KIND, resource = %K::describe(&state), "created");
        Ok(state)
    }

    async fn read(
        &self,
        cancel: &CancellationToken,
        state: &K::State,
    ) -> ResourceResult<Option<K::State>> {
        let path = K::object_path(state)?;
        let fetched = absent_on_not_found(
            self.client.get::<K::Response>(cancel, &path).await,
            || action::<K>(Op::Read, state),
        )?;

        let Some(response) = fetched else {
            tracing::info!(
                kind = %K::KIND,
                resource = %K::describe(state),
                "not found remotely, removing from state"
            );
            return Ok(None);
        };

        let mut refreshed = state.clone();
        K::apply(&mut refreshed, response);
        Ok(Some(refreshed))
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        desired: &K::State,
        prior: &K::State,
    ) -> ResourceResult<K::State> {
        let Some(body) = K::update_body(desired)? else {
            tracing::trace!(kind = %K::KIND, "no updatable fields, keeping prior state");
            return Ok(prior.clone());
        };

        let path = K::object_path(desired)?;
        let response: K::Response = self
            .client
            .put(cancel, &path, Some(&body))
            .await
            .map_err(|e| ResourceError::client(action::<K>(Op::Update, desired), e))?;

        let mut state = desired.clone();
        K::apply(&mut state, response);
        tracing::debug!(kind = %K::KIND, resource = %K::describe(&state), "updated");
        Ok(state)
    }

    async fn delete(&self, cancel: &CancellationToken, state: &K::State) -> ResourceResult<()> {
        let path = K::object_path(state)?;
        escalate(self.client.delete(cancel, &path).await, || {
            action::<K>(Op::Delete, state)
        })?;
        tracing::debug!(kind = %K::KIND, resource = %K::describe(state), "deleted");
        Ok(())
    }

    fn import(&self, id: &str) -> ResourceResult<K::State> {
        K::import(id)
    }
}

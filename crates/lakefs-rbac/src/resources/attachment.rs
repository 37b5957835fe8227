//! Generic lifecycle for many-to-many edges.
//!
//! An edge is identified only by its two endpoints. It exists exactly when
//! lakeFS lists the target under the owner, so there is no update and a read
//! is a membership check.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{Controller, Op, split_import_id};
use crate::classify::{absent_on_not_found, escalate};
use crate::error::ResourceResult;
use crate::model::ResourceKind;
use crate::plan::Plannable;
use crate::transport::{ApiClient, ApiPath};

/// How presence of an edge is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRead {
    /// List the owner's edges and search for the target, following pages.
    ListSearch,
    /// `GET` the edge path itself.
    DirectGet,
}

/// Kind-specific hooks for [`AttachmentController`].
pub trait EdgeKind: Send + Sync + 'static {
    type State: Plannable + Clone + Send + Sync + 'static;

    const KIND: ResourceKind;
    /// Collection the owner lives in, `groups` or `users`.
    const OWNER_COLLECTION: &'static str;
    /// Relation below the owner, `members` or `policies`.
    const RELATION: &'static str;
    const READ: EdgeRead;
    /// Accepted import format, e.g. `<group_id>:<user_id>`.
    const IMPORT_FORMAT: &'static str;

    fn owner(state: &Self::State) -> &str;
    fn target(state: &Self::State) -> &str;
    fn from_endpoints(owner: &str, target: &str) -> Self::State;

    /// Wording for diagnostics, e.g. `add user u1 to group g1`.
    fn action(op: Op, state: &Self::State) -> String;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<IdRef>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_offset: String,
}

/// Controller for an [`EdgeKind`], bound to its transport at construction.
pub struct AttachmentController<K> {
    client: ApiClient,
    _kind: PhantomData<fn() -> K>,
}

impl<K: EdgeKind> AttachmentController<K> {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn list_path(state: &K::State) -> ApiPath {
        ApiPath::auth()
            .join(K::OWNER_COLLECTION)
            .join(K::owner(state))
            .join(K::RELATION)
    }

    fn edge_path(state: &K::State) -> ApiPath {
        Self::list_path(state).join(K::target(state))
    }

    async fn is_listed(&self, cancel: &CancellationToken, state: &K::State) -> ResourceResult<bool> {
        let target = K::target(state);
        let mut after: Option<String> = None;
        let mut seen = BTreeSet::new();
        loop {
            let mut path = Self::list_path(state);
            if let Some(offset) = &after {
                path = path.with_query("after", offset.clone());
            }
            let page = absent_on_not_found(
                self.client.get::<ListResponse>(cancel, &path).await,
                || K::action(Op::Read, state),
            )?;
            let Some(page) = page else {
                return Ok(false);
            };
            if page.results.iter().any(|entry| entry.id == target) {
                return Ok(true);
            }
            match page.pagination {
                Some(p)
                    if p.has_more
                        && !p.next_offset.is_empty()
                        && seen.insert(p.next_offset.clone()) =>
                {
                    after = Some(p.next_offset);
                }
                _ => return Ok(false),
            }
        }
    }

    async fn edge_exists(
        &self,
        cancel: &CancellationToken,
        state: &K::State,
    ) -> ResourceResult<bool> {
        let path = Self::edge_path(state);
        let fetched = absent_on_not_found(
            self.client.get::<serde_json::Value>(cancel, &path).await,
            || K::action(Op::Read, state),
        )?;
        Ok(fetched.is_some())
    }
}

impl<K> Clone for AttachmentController<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: EdgeKind> fmt::Debug for AttachmentController<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentController")
            .field("kind", &K::KIND)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<K: EdgeKind> Controller for AttachmentController<K> {
    type State = K::State;

    fn kind(&self) -> ResourceKind {
        K::KIND
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: &K::State,
    ) -> ResourceResult<K::State> {
        let path = Self::edge_path(desired);
        escalate(self.client.put_empty(cancel, &path).await, || {
            K::action(Op::Create, desired)
        })?;
        tracing::trace!(kind = %K::KIND, edge = %path, "edge created");
        Ok(desired.clone())
    }

    async fn read(
        &self,
        cancel: &CancellationToken,
        state: &K::State,
    ) -> ResourceResult<Option<K::State>> {
        let present = match K::READ {
            EdgeRead::ListSearch => self.is_listed(cancel, state).await?,
            EdgeRead::DirectGet => self.edge_exists(cancel, state).await?,
        };
        if present {
            Ok(Some(state.clone()))
        } else {
            tracing::info!(
                kind = %K::KIND,
                owner = K::owner(state),
                target = K::target(state),
                "edge not found remotely, removing from state"
            );
            Ok(None)
        }
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        _desired: &K::State,
        prior: &K::State,
    ) -> ResourceResult<K::State> {
        Ok(prior.clone())
    }

    async fn delete(&self, cancel: &CancellationToken, state: &K::State) -> ResourceResult<()> {
        let path = Self::edge_path(state);
        escalate(self.client.delete(cancel, &path).await, || {
            K::action(Op::Delete, state)
        })?;
        tracing::trace!(kind = %K::KIND, edge = %path, "edge deleted");
        Ok(())
    }

    fn import(&self, id: &str) -> ResourceResult<K::State> {
        let (owner, target) = split_import_id(id, K::IMPORT_FORMAT)?;
        Ok(K::from_endpoints(owner, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::ClientError;
    use crate::model::GroupMembership;
    use crate::resources::MembershipKind;
    use crate::transport::Transport;

    /// Member listing whose offsets cycle `a -> b -> a`.
    #[derive(Default)]
    struct CyclingPages {
        gets: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CyclingPages {
        async fn get(&self, path: &ApiPath) -> Result<String, ClientError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let after = path.query().first().map(|(_, v)| v.as_str());
            let next = if after == Some("a") { "b" } else { "a" };
            Ok(format!(
                r#"{{"results":[{{"id":"other"}}],"pagination":{{"has_more":true,"next_offset":"{next}"}}}}"#
            ))
        }

        async fn post(&self, path: &ApiPath, _body: Option<String>) -> Result<String, ClientError> {
            Err(ClientError::http(405, path.to_string()))
        }

        async fn put(&self, path: &ApiPath, _body: Option<String>) -> Result<String, ClientError> {
            Err(ClientError::http(405, path.to_string()))
        }

        async fn delete(&self, path: &ApiPath) -> Result<(), ClientError> {
            Err(ClientError::http(405, path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_cycling_offsets_end_the_search() {
        let transport = Arc::new(CyclingPages::default());
        let controller =
            AttachmentController::<MembershipKind>::new(ApiClient::new(transport.clone()));
        let edge = GroupMembership {
            group_id: "g1".into(),
            user_id: "u1".into(),
        };

        let found = controller
            .read(&CancellationToken::new(), &edge)
            .await
            .unwrap();
        assert_eq!(found, None);
        // first page, then "a", then "b"; "a" again is not fetched
        assert_eq!(transport.gets.load(Ordering::SeqCst), 3);
    }
}

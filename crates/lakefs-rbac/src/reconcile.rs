//! Turns desired configuration into the call sequence for one instance.
//!
//! The sequence is always: refresh prior state, plan against the refreshed
//! state, then create, update, delete, or delete-then-create. Ordering
//! across instances (a membership after its user and group) is the caller's
//! concern.

use tokio_util::sync::CancellationToken;

use crate::error::{ResourceError, ResourceResult};
use crate::plan::{Plan, plan};
use crate::resources::Controller;

/// Result of reconciling one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<S> {
    /// The plan that was executed.
    pub plan: Plan,
    /// State to persist; `None` when the instance no longer exists.
    pub state: Option<S>,
}

/// Converges one instance to `desired`, starting from `prior`.
///
/// `desired == None` destroys the instance. A prior record whose remote
/// object has vanished is treated as never created. If a replacement fails
/// after its delete step the error is [`ResourceError::ReplaceIncomplete`]
/// and the prior record is stale.
pub async fn reconcile<C: Controller>(
    controller: &C,
    cancel: &CancellationToken,
    desired: Option<&C::State>,
    prior: Option<&C::State>,
) -> ResourceResult<Outcome<C::State>> {
    let refreshed = match prior {
        Some(prior) => controller.read(cancel, prior).await?,
        None => None,
    };

    let plan = plan(desired, refreshed.as_ref());
    tracing::debug!(kind = %controller.kind(), %plan, "planned");

    let state = match (&plan, desired, refreshed) {
        (Plan::Create, Some(desired), _) => Some(controller.create(cancel, desired).await?),
        (Plan::Update { .. }, Some(desired), Some(current)) => {
            Some(controller.update(cancel, desired, &current).await?)
        }
        (Plan::Replace { fields }, Some(desired), Some(current)) => {
            tracing::info!(
                kind = %controller.kind(),
                fields = %fields.join(","),
                "immutable fields changed, replacing"
            );
            controller.delete(cancel, &current).await?;
            let created = controller.create(cancel, desired).await.map_err(|e| {
                ResourceError::ReplaceIncomplete {
                    source: Box::new(e),
                }
            })?;
            Some(created)
        }
        (Plan::Delete, _, Some(current)) => {
            controller.delete(cancel, &current).await?;
            None
        }
        (_, _, refreshed) => refreshed,
    };

    Ok(Outcome { plan, state })
}

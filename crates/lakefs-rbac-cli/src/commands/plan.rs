use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use lakefs_rbac::{Plan, Provider, ResourceError, ResourceState};
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::manifest::{self, Entry};
use crate::output::{ChangeRow, print_changes, print_success};

/// Refreshes prior state and reports what `apply` would do.
pub async fn plan(
    provider: &Provider,
    cancel: &CancellationToken,
    desired: &Path,
    state: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let pairs = manifest::pair(manifest::read_manifest(desired)?, manifest::read_state(state)?);

    let mut rows = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        let refreshed = match &pair.prior {
            Some(prior) => provider
                .read(cancel, prior)
                .await
                .with_context(|| format!("Failed to refresh {}", pair.name))?,
            None => None,
        };
        let plan = provider.plan(pair.desired.as_ref(), refreshed.as_ref())?;
        let shown = pair.desired.as_ref().or(pair.prior.as_ref());
        rows.push(ChangeRow::new(&pair.name, shown, &plan));
    }
    print_changes(&rows, format)
}

/// Reconciles every named instance, then writes the resulting state.
///
/// State is written even when an instance fails, so instances already
/// reconciled are not lost. The failing one keeps its prior record unless
/// the failure left it absent remotely.
pub async fn apply(
    provider: &Provider,
    cancel: &CancellationToken,
    desired: &Path,
    state: Option<&Path>,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let prior = manifest::read_state(state)?;
    let order: Vec<String> = prior.iter().map(|e| e.name.clone()).collect();
    let pairs = manifest::pair(manifest::read_manifest(desired)?, prior);

    let mut current: BTreeMap<String, ResourceState> = pairs
        .iter()
        .filter_map(|p| p.prior.clone().map(|s| (p.name.clone(), s)))
        .collect();
    let mut rows = Vec::with_capacity(pairs.len());
    let mut failure = None;

    for pair in &pairs {
        match provider
            .reconcile(cancel, pair.desired.as_ref(), pair.prior.as_ref())
            .await
        {
            Ok(outcome) => {
                let shown = outcome
                    .state
                    .as_ref()
                    .or(pair.desired.as_ref())
                    .or(pair.prior.as_ref());
                rows.push(ChangeRow::new(&pair.name, shown, &outcome.plan));
                match outcome.state {
                    Some(state) => current.insert(pair.name.clone(), state),
                    None => current.remove(&pair.name),
                };
            }
            Err(e) => {
                tracing::warn!(name = %pair.name, error = %e, "reconcile failed");
                forget_if_absent(&mut current, &pair.name, &e);
                failure = Some(anyhow::Error::new(e).context(format!(
                    "Failed to apply {}",
                    pair.name
                )));
                break;
            }
        }
    }

    let entries = ordered(current, &order, &pairs);
    manifest::write_manifest(out.or(state), &entries)?;
    if let Some(err) = failure {
        return Err(err);
    }

    let changed = rows
        .iter()
        .filter(|r| r.action != Plan::NoOp.to_string())
        .count();
    if out.or(state).is_some() {
        print_changes(&rows, format)?;
        print_success(&format!("Applied {changed} change(s)"));
    }
    Ok(())
}

fn forget_if_absent(
    current: &mut BTreeMap<String, ResourceState>,
    name: &str,
    err: &ResourceError,
) {
    if err.left_absent() && current.remove(name).is_some() {
        tracing::info!(name, "dropping record of an object deleted by a failed replacement");
    }
}

/// Prior entries keep their position; new ones follow in execution order.
fn ordered(
    mut current: BTreeMap<String, ResourceState>,
    prior_order: &[String],
    pairs: &[manifest::Pairing],
) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(current.len());
    let names = prior_order.iter().chain(pairs.iter().map(|p| &p.name));
    for name in names {
        if let Some(resource) = current.remove(name) {
            entries.push(Entry {
                name: name.clone(),
                resource,
            });
        }
    }
    entries
}

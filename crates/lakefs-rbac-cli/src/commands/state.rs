use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use lakefs_rbac::{Provider, ResourceKind};
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::manifest;
use crate::output::{print_states, print_success, print_warning};

/// Seeds state from an import identifier and hydrates it with a read.
pub async fn import(
    provider: &Provider,
    cancel: &CancellationToken,
    kind: ResourceKind,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    let seed = provider.import(kind, id)?;
    match provider.read(cancel, &seed).await? {
        Some(state) => print_states(&[(None, &state)], format),
        None => anyhow::bail!("Cannot import {kind} {id}: not found in lakeFS"),
    }
}

pub async fn read(
    provider: &Provider,
    cancel: &CancellationToken,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let state = manifest::read_record(path)?;
    match provider.read(cancel, &state).await? {
        Some(refreshed) => print_states(&[(None, &refreshed)], format),
        None => {
            print_warning(&format!(
                "{} {} no longer exists; drop it from state",
                state.kind(),
                state.import_id()
            ));
            Ok(())
        }
    }
}

pub async fn create(
    provider: &Provider,
    cancel: &CancellationToken,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let desired = manifest::read_record(path)?;
    let created = provider.create(cancel, &desired).await?;
    print_success(&format!(
        "Created {} {}",
        created.kind().to_string().cyan(),
        created.import_id().cyan()
    ));
    print_states(&[(None, &created)], format)
}

pub async fn delete(
    provider: &Provider,
    cancel: &CancellationToken,
    path: Option<&Path>,
) -> Result<()> {
    let state = manifest::read_record(path)?;
    provider.delete(cancel, &state).await?;
    print_success(&format!(
        "Deleted {} {}",
        state.kind().to_string().cyan(),
        state.import_id().cyan()
    ));
    Ok(())
}

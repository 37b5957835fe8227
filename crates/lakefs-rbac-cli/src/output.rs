use anyhow::Result;
use colored::Colorize;
use lakefs_rbac::{Plan, ResourceState};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Prints resource records, optionally named.
pub fn print_states(rows: &[(Option<&str>, &ResourceState)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let states: Vec<&ResourceState> = rows.iter().map(|(_, s)| *s).collect();
            if let [single] = states.as_slice() {
                print_json(single)
            } else {
                print_json(&states)
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No resources.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["Name", "Kind", "ID", "Created", "Details"]);
            for (name, state) in rows {
                let created = creation_date(state).map_or_else(|| "-".to_string(), format_timestamp);
                builder.push_record([
                    name.unwrap_or("-").to_string(),
                    state.kind().to_string(),
                    state.import_id(),
                    created,
                    details(state),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            Ok(())
        }
    }
}

/// One planned or applied change.
#[derive(Debug, Serialize)]
pub struct ChangeRow {
    pub name: String,
    pub kind: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChangeRow {
    pub fn new(name: &str, state: Option<&ResourceState>, plan: &Plan) -> Self {
        Self {
            name: name.to_string(),
            kind: state.map_or_else(|| "-".to_string(), |s| s.kind().to_string()),
            action: plan.to_string(),
            id: state.map(ResourceState::import_id),
        }
    }
}

pub fn print_changes(rows: &[ChangeRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Name", "Kind", "ID", "Action"]);
            for row in rows {
                builder.push_record([
                    row.name.clone(),
                    row.kind.clone(),
                    row.id.clone().unwrap_or_else(|| "-".to_string()),
                    colored_action(&row.action),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            let pending = rows.iter().filter(|r| r.action != "no changes").count();
            println!("{pending} of {} resources with changes", rows.len());
            Ok(())
        }
    }
}

fn colored_action(action: &str) -> String {
    if action.starts_with("create") {
        action.green().to_string()
    } else if action.starts_with("delete") || action.starts_with("replace") {
        action.red().to_string()
    } else if action.starts_with("update") {
        action.yellow().to_string()
    } else {
        action.to_string()
    }
}

fn creation_date(state: &ResourceState) -> Option<i64> {
    match state {
        ResourceState::User(u) => u.creation_date,
        ResourceState::Group(g) => g.creation_date,
        ResourceState::Policy(p) => p.creation_date,
        ResourceState::UserCredentials(c) => c.creation_date,
        ResourceState::GroupMembership(_)
        | ResourceState::GroupPolicyAttachment(_)
        | ResourceState::UserPolicyAttachment(_) => None,
    }
}

/// Kind-specific detail column. Secrets never appear here.
fn details(state: &ResourceState) -> String {
    match state {
        ResourceState::User(u) => u.friendly_name.clone().unwrap_or_default(),
        ResourceState::Group(g) => g.description.clone().unwrap_or_default(),
        ResourceState::Policy(p) => p.statement.clone(),
        ResourceState::UserCredentials(c) => match &c.secret_access_key {
            Some(_) => "secret: <redacted>".to_string(),
            None => String::new(),
        },
        ResourceState::GroupMembership(_)
        | ResourceState::GroupPolicyAttachment(_)
        | ResourceState::UserPolicyAttachment(_) => String::new(),
    }
}

/// Unix seconds as RFC 3339, falling back to the raw number.
pub fn format_timestamp(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

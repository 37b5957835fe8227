use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lakefs_rbac::ResourceKind;

#[derive(Parser)]
#[command(name = "lakefs-rbac")]
#[command(about = "Reconcile lakeFS users, groups, policies and their attachments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// lakeFS endpoint (overrides config and LAKEFS_ENDPOINT env var)
    #[arg(short, long, global = true, env = "LAKEFS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "LAKEFS_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store credentials for a lakeFS endpoint
    Login(LoginArgs),
    /// Logout (remove stored credentials)
    Logout,
    /// Show current auth info
    Whoami,
    /// Manage CLI configuration
    Config(ConfigArgs),
    /// Import an existing object and print its state
    Import(ImportArgs),
    /// Refresh a state record from lakeFS
    Read(StateArgs),
    /// Create the object described by a state record
    Create(CreateArgs),
    /// Delete the object described by a state record
    Delete(StateArgs),
    /// Show the changes needed to reach a desired manifest
    Plan(PlanArgs),
    /// Apply a desired manifest and write the resulting state
    Apply(ApplyArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum AuthFlow {
    /// Access key pair sent as HTTP Basic Auth (default)
    #[default]
    Basic,
    /// Pre-issued session token sent as Bearer
    Token,
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Access key ID
    #[arg(long, env = "LAKEFS_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,
    /// Secret access key
    #[arg(long, env = "LAKEFS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
    /// Session token (with --auth-flow token)
    #[arg(long)]
    pub token: Option<String>,
    /// Auth flow to use
    #[arg(long, default_value = "basic")]
    pub auth_flow: AuthFlow,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Resource kind (user, group, policy, user_credentials, group_membership,
    /// group_policy_attachment, user_policy_attachment)
    pub kind: ResourceKind,
    /// Import identifier, e.g. `u1`, `u1:AKIA...` or `g1:u1`
    pub id: String,
}

#[derive(clap::Args)]
pub struct StateArgs {
    /// Path to a JSON state record (reads from stdin if omitted)
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Path to a JSON state record (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Desired manifest
    #[arg(long)]
    pub desired: PathBuf,
    /// Prior state manifest
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Desired manifest
    #[arg(long)]
    pub desired: PathBuf,
    /// Prior state manifest
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Where to write the new state (defaults to --state, else stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (endpoint, format, timeout_secs)
    pub key: String,
    /// Value
    pub value: String,
}

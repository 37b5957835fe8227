mod auth;
mod cli;
mod commands;
mod config;
mod manifest;
mod observability;
mod output;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use lakefs_rbac::{HttpTransport, HttpTransportConfig, Provider};
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    let dir = config::base_dir()?;
    let profile = &cli.profile;
    let profile_cfg = config::load_profile(&dir, profile)?;
    let format = match cli.format {
        Some(f) => f,
        None => profile_cfg.output_format()?.unwrap_or_default(),
    };

    match &cli.command {
        Commands::Login(args) => {
            let endpoint = config::resolve_endpoint(&dir, cli.endpoint.as_deref(), profile)?;
            commands::auth::login(&dir, &endpoint, args, profile)?;
        }
        Commands::Logout => {
            commands::auth::logout(&dir, profile)?;
        }
        Commands::Whoami => {
            commands::auth::whoami(&dir, profile)?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Endpoint".cyan(),
                    profile_cfg.endpoint.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("json")
                );
                println!(
                    "{}: {}s",
                    "Timeout".cyan(),
                    profile_cfg.timeout().as_secs()
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(&dir, profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Import(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::state::import(&provider, &cancel, args.kind, &args.id, format).await?;
        }
        Commands::Read(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::state::read(&provider, &cancel, args.state.as_deref(), format).await?;
        }
        Commands::Create(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::state::create(&provider, &cancel, args.file.as_deref(), format).await?;
        }
        Commands::Delete(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::state::delete(&provider, &cancel, args.state.as_deref()).await?;
        }
        Commands::Plan(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::plan::plan(
                &provider,
                &cancel,
                &args.desired,
                args.state.as_deref(),
                format,
            )
            .await?;
        }
        Commands::Apply(args) => {
            let (provider, cancel) = connect(&cli, &dir, &profile_cfg)?;
            commands::plan::apply(
                &provider,
                &cancel,
                &args.desired,
                args.state.as_deref(),
                args.out.as_deref(),
                format,
            )
            .await?;
        }
    }

    Ok(())
}

/// Builds a provider for the resolved endpoint and a token cancelled on
/// Ctrl-C.
fn connect(
    cli: &Cli,
    dir: &Path,
    profile_cfg: &config::ProfileConfig,
) -> Result<(Provider, CancellationToken)> {
    let endpoint = config::resolve_endpoint(dir, cli.endpoint.as_deref(), &cli.profile)?;
    let mut transport_cfg = HttpTransportConfig::new(&endpoint).with_timeout(profile_cfg.timeout());
    match auth::resolve_credentials(dir, &cli.profile, &endpoint)? {
        Some(creds) => transport_cfg = creds.apply(transport_cfg),
        None => tracing::warn!(%endpoint, "no credentials configured, sending anonymous requests"),
    }
    let transport = HttpTransport::new(transport_cfg)
        .with_context(|| format!("Cannot use endpoint {endpoint}"))?;
    tracing::debug!(base_url = %transport.base_url(), "connected");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight requests");
            on_signal.cancel();
        }
    });

    Ok((Provider::from_transport(Arc::new(transport)), cancel))
}

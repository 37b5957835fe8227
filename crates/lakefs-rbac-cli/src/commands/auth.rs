use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::auth::{self, StoredCredentials};
use crate::cli::{AuthFlow, LoginArgs};
use crate::output::{print_error, print_success};

pub fn login(dir: &Path, endpoint: &str, args: &LoginArgs, profile: &str) -> Result<()> {
    let creds = match args.auth_flow {
        AuthFlow::Basic => {
            let access_key_id = args
                .access_key_id
                .as_deref()
                .context("--access-key-id is required")?;
            let secret_access_key = args
                .secret_access_key
                .as_deref()
                .context("--secret-access-key is required")?;
            StoredCredentials::Basic {
                endpoint: endpoint.to_string(),
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
            }
        }
        AuthFlow::Token => {
            let token = args
                .token
                .as_deref()
                .context("--token is required for --auth-flow token")?;
            StoredCredentials::Bearer {
                endpoint: endpoint.to_string(),
                token: token.to_string(),
            }
        }
    };
    auth::save_credentials(dir, profile, &creds)?;

    let who = match &creds {
        StoredCredentials::Basic { access_key_id, .. } => format!("key: {access_key_id}"),
        StoredCredentials::Bearer { .. } => "token".to_string(),
    };
    print_success(&format!(
        "Saved credentials for {} ({})",
        endpoint.cyan(),
        who.cyan()
    ));
    Ok(())
}

pub fn logout(dir: &Path, profile: &str) -> Result<()> {
    if auth::remove_credentials(dir, profile)? {
        print_success("Logged out (credentials removed)");
    } else {
        println!("No credentials found for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(dir: &Path, profile: &str) -> Result<()> {
    match auth::load_credentials(dir, profile)? {
        Some(creds) => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!("{}: {}", "Endpoint".cyan(), creds.endpoint().cyan());
            match &creds {
                StoredCredentials::Basic { access_key_id, .. } => {
                    println!("{}: Basic (key: {})", "Auth".cyan(), access_key_id);
                }
                StoredCredentials::Bearer { token, .. } => {
                    println!("{}: Bearer (token: {})", "Auth".cyan(), preview(token));
                }
            }
        }
        None => {
            print_error(&format!("Not logged in (profile: \"{profile}\")"));
        }
    }
    Ok(())
}

fn preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "*".repeat(chars.len())
    }
}

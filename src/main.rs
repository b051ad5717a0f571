//! osconsole - interactive console for OpenStack clouds.
//!
//! Authenticates against Keystone from `OS_*` flags/environment variables
//! and drops the operator into a shell wired up with per-service clients.

mod auth;
mod cli;
mod clients;
mod output;
mod shell;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use auth::{Credentials, Session};
use cli::Cli;
use clients::ClientManager;

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Versioned auth URLs trip up version discovery; nudge the operator
/// towards a versionless OS_AUTH_URL.
fn check_auth_url(credentials: &Credentials) {
    if let Some(ref url) = credentials.auth_url {
        if url.contains("/v2") {
            output::print_warning(
                "WARNING: You are using a deprecated Keystone version.\n\
                 It is highly recommended to switch to v3 and set OS_AUTH_URL\n\
                 to be versionless.",
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    output::init_colors();

    let cli = Cli::parse();
    let mut credentials = Credentials::from_cli(&cli);

    // A username without a password or token usually means the operator
    // just didn't export OS_PASSWORD; ask instead of failing, but only
    // when there is a terminal to ask on.
    if credentials.token.is_none()
        && credentials.username.is_some()
        && credentials.password.is_none()
        && io::stdin().is_terminal()
    {
        let password = rpassword::prompt_password("OS password: ")
            .context("failed to read password from terminal")?;
        if !password.is_empty() {
            credentials.password = Some(password);
        }
    }

    check_auth_url(&credentials);
    let default_region = credentials.region_name.clone();

    let session = match Session::build(credentials) {
        Ok(session) => Arc::new(session),
        Err(e) if e.is_missing_credentials() => {
            output::print_error("ERROR: Environment variables not set up.");
            output::print_error(&format!("({})", e));
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to build session"),
    };

    // Fetch the token up front so credential problems surface before the
    // shell starts.
    match session.token().await {
        Ok(_) => info!("Authenticated against {}", session.auth_endpoint()),
        Err(e) if e.is_missing_credentials() => {
            output::print_error("ERROR: Environment variables not set up.");
            output::print_error(&format!("({})", e));
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("authentication failed"),
    }

    let manager = ClientManager::new(Arc::clone(&session), default_region);
    shell::run(session, manager).await
}

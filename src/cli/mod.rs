//! CLI entry point for Orbit.

pub mod auth;
pub mod errors;
pub mod terminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::ConfigOverrides;

/// Orbit device-flow authentication CLI
#[derive(Parser, Debug)]
#[command(name = "orbit", version, about = "Orbit device flow authentication CLI")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with the device authorization flow
    Login(LoginArgs),
    /// Sign out and remove the stored token
    Logout(LogoutArgs),
    /// Show current authentication status
    Status(ServerArgs),
    /// Show the currently signed-in user
    Whoami(ServerArgs),
}

/// Arguments shared by commands that only talk to the server.
#[derive(Parser, Debug)]
pub struct ServerArgs {
    /// Auth server URL (defaults to ORBIT_SERVER_URL or http://localhost:3005)
    #[arg(long)]
    pub server_url: Option<String>,
}

/// Arguments for `orbit login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Auth server URL (defaults to ORBIT_SERVER_URL or http://localhost:3005)
    #[arg(long)]
    pub server_url: Option<String>,

    /// OAuth client ID (defaults to ORBIT_CLIENT_ID or GITHUB_CLIENT_ID)
    #[arg(long)]
    pub client_id: Option<String>,

    /// Requested scope
    #[arg(long)]
    pub scope: Option<String>,

    /// Never offer to open the verification URL in a browser
    #[arg(long)]
    pub no_browser: bool,
}

/// Arguments for `orbit logout`.
#[derive(Parser, Debug)]
pub struct LogoutArgs {
    /// Auth server URL (defaults to ORBIT_SERVER_URL or http://localhost:3005)
    #[arg(long)]
    pub server_url: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

impl ServerArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides::builder()
            .maybe_server_url(self.server_url.clone())
            .build()
    }
}

impl LoginArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides::builder()
            .maybe_server_url(self.server_url.clone())
            .maybe_client_id(self.client_id.clone())
            .maybe_scope(self.scope.clone())
            .build()
    }
}

impl LogoutArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides::builder()
            .maybe_server_url(self.server_url.clone())
            .build()
    }
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "orbit=debug" } else { "orbit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Orbit CLI binary entry point.

use std::process::ExitCode;

use orbit::cli::errors::format_error_help;
use orbit::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    cli::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Login(args) => cli::auth::handle_login(args).await,
        Commands::Logout(args) => cli::auth::handle_logout(args).await,
        Commands::Status(args) => cli::auth::handle_status(args).await,
        Commands::Whoami(args) => cli::auth::handle_whoami(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(category = %e.category(), error = ?e, "command failed");
            eprintln!("Error: {}", format_error_help(&e));
            ExitCode::FAILURE
        }
    }
}

//! CLI command handlers for login, logout, status, and whoami.
//!
//! Handlers return `Ok` for success and benign no-ops; `main` turns `Err`
//! into exit code 1. Concurrent invocations share one token file without
//! locking and are not supported.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio_util::sync::CancellationToken;

use super::terminal::TerminalInteraction;
use super::{LoginArgs, LogoutArgs, ServerArgs};
use crate::auth::{AuthError, AuthService, LoginOutcome, LogoutOutcome, StatusReport};
use crate::config::OrbitConfig;

const RULE_WIDTH: usize = 50;

/// Handle `orbit login`.
pub async fn handle_login(args: LoginArgs) -> Result<(), AuthError> {
    let config = OrbitConfig::from_env().with_overrides(args.overrides());
    println!("Server URL: {}", config.server_url);
    println!(
        "Client ID:  {}",
        config.client_id.as_deref().unwrap_or("NOT SET")
    );
    config.require_client_id()?;

    let cancel = CancellationToken::new();
    let svc = AuthService::from_config(&config)?.with_cancellation(cancel.clone());
    let interaction = Arc::new(TerminalInteraction::new(!args.no_browser));

    // Ctrl-C ends the flow with `AuthError::Cancelled`. A blocking stdin read
    // cannot observe the token, so a pending prompt exits directly.
    let ctrl_c = tokio::spawn({
        let interaction = interaction.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
                if interaction.is_prompting() {
                    eprintln!();
                    eprintln!("Login cancelled");
                    std::process::exit(1);
                }
            }
        }
    });
    let outcome = svc
        .login(
            config.client_id.as_deref(),
            &config.scope,
            interaction.clone(),
        )
        .await;
    ctrl_c.abort();
    interaction.finish_progress();

    match outcome? {
        LoginOutcome::Cancelled => println!("Login cancelled"),
        LoginOutcome::LoggedIn {
            user,
            persist_error,
            ..
        } => {
            if let Some(err) = persist_error {
                eprintln!("Warning: failed to store authentication token locally ({err})");
                eprintln!("   The token will not be available to later commands.");
            }
            let name = user
                .as_ref()
                .map(|user| user.display_name())
                .unwrap_or("User");
            println!("Login successful! Logged in as {name}");
        }
    }
    Ok(())
}

/// Handle `orbit logout`.
pub async fn handle_logout(args: LogoutArgs) -> Result<(), AuthError> {
    let config = OrbitConfig::from_env().with_overrides(args.overrides());
    let svc = AuthService::from_config(&config)?;
    let interaction = Arc::new(TerminalInteraction::new(false));

    match svc.logout(args.force, interaction).await {
        LogoutOutcome::NotLoggedIn => println!("You are not currently logged in"),
        LogoutOutcome::Cancelled => println!("Logout cancelled"),
        LogoutOutcome::LoggedOut {
            user_name,
            remote_signed_out,
            deleted,
        } => {
            if !remote_signed_out {
                println!("Note: could not revoke token on server");
            }
            if deleted {
                println!("Successfully logged out {user_name}");
                println!("   Your local session has been cleared");
            } else {
                println!("Logout completed with warnings");
                println!("   Could not delete local token file");
            }
        }
    }
    Ok(())
}

/// Handle `orbit status`. Never fails once the service is built.
pub async fn handle_status(args: ServerArgs) -> Result<(), AuthError> {
    let config = OrbitConfig::from_env().with_overrides(args.overrides());
    let svc = AuthService::from_config(&config)?;

    println!("Orbit CLI Status");
    println!("{}", "-".repeat(RULE_WIDTH));
    match svc.status().await {
        StatusReport::NotLoggedIn => {
            println!("  Status: Not logged in");
            println!("  Server: {}", config.server_url);
            println!();
            println!("  Run 'orbit login' to authenticate");
        }
        StatusReport::SessionExpired { .. } => {
            println!("  Status: Session expired");
            println!("  Server: {}", config.server_url);
            println!();
            println!("  Run 'orbit login' to re-authenticate");
        }
        StatusReport::Unreachable { message, .. } => {
            println!("  Status: Error checking status");
            println!("  Server: {}", config.server_url);
            println!();
            println!("  Error: {message}");
        }
        StatusReport::LoggedIn { user, record } => {
            println!("  Status: Logged in");
            println!("  Server: {}", config.server_url);
            println!("  User:   {}", user.display_name());
            println!("  Since:  {}", format_timestamp(record.created_at));
        }
    }
    Ok(())
}

/// Handle `orbit whoami`. Session failures are fatal here.
pub async fn handle_whoami(args: ServerArgs) -> Result<(), AuthError> {
    let config = OrbitConfig::from_env().with_overrides(args.overrides());
    let svc = AuthService::from_config(&config)?;

    let identity = match svc.whoami().await {
        Ok(identity) => identity,
        Err(AuthError::NotLoggedIn) => {
            println!("You are not logged in");
            println!("   Run 'orbit login' to authenticate");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let user = &identity.session.user;
    let record = &identity.record;
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("  User Information:");
    if let Some(name) = &user.name {
        println!("  Name:     {name}");
    }
    if let Some(email) = &user.email {
        println!("  Email:    {email}");
    }
    if let Some(image) = &user.image {
        println!("  Avatar:   {image}");
    }
    println!("  User ID:  {}", user.id.as_deref().unwrap_or("N/A"));
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("  Session Information:");
    println!("  Token Type:    {}", record.token_type);
    println!("  Scope:         {}", record.scope.as_deref().unwrap_or("N/A"));
    println!("  Logged in at:  {}", format_timestamp(record.created_at));
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("Session is active");
    Ok(())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

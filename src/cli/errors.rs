//! CLI-specific error formatting for user-facing messages.

use crate::auth::AuthError;

/// Map an [`AuthError`] to a short message with a corrective suggestion.
pub fn format_error_help(err: &AuthError) -> String {
    match err {
        AuthError::MissingClientId => {
            "Client ID is not configured. Set ORBIT_CLIENT_ID (or GITHUB_CLIENT_ID) in your .env file or pass --client-id".to_string()
        }
        AuthError::EndpointNotFound => {
            "Device authorization endpoint not found. Make sure your auth server is running and --server-url points at it".to_string()
        }
        AuthError::BadRequest(msg) => {
            format!("Bad request: {msg}. Check your client ID (ORBIT_CLIENT_ID or --client-id)")
        }
        AuthError::RequestFailed { .. } => {
            format!("{err}. Check the auth server and run: orbit login")
        }
        AuthError::AccessDenied => {
            "Access was denied by the user. Run: orbit login to try again".to_string()
        }
        AuthError::ExpiredToken => {
            "The device code has expired. Run: orbit login to start over".to_string()
        }
        AuthError::Server { .. } => format!("{err}. Run: orbit login to try again"),
        AuthError::Network(_) => {
            format!("{err}. Check that the auth server is reachable, then run the command again")
        }
        AuthError::NotLoggedIn => "You are not logged in. Run: orbit login".to_string(),
        AuthError::Unauthenticated => {
            "Your session may have expired. Run: orbit login to re-authenticate".to_string()
        }
        AuthError::InvalidResponse(_) => {
            format!("{err}. Check the auth server, then run: orbit login to re-authenticate")
        }
        AuthError::Cancelled => "Login cancelled. Run: orbit login to start again".to_string(),
        AuthError::Io(_) => {
            format!(
                "{err}. Check the permissions of the config directory \
                 (ORBIT_CONFIG_DIR, default ~/.better-auth)"
            )
        }
        AuthError::Serialization(_) => {
            format!("{err}. The token could not be encoded. Run: orbit login to try again")
        }
    }
}

//! Orbit: OAuth2 device-authorization client
//!
//! Requests a device code, lets a human approve it in a browser, polls the
//! token endpoint until the grant completes, and keeps the resulting bearer
//! token on disk for later session lookups.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use orbit::auth::{AuthService, DeviceAuthorization, Interaction, LoginOutcome, TokenRecord};
//! use orbit::config::OrbitConfig;
//!
//! struct AutoApprove;
//!
//! impl Interaction for AutoApprove {
//!     fn confirm_reauthentication(&self, _existing: &TokenRecord) -> bool { true }
//!     fn present_authorization(&self, auth: &DeviceAuthorization) {
//!         println!("Visit {} and enter {}", auth.verification_uri, auth.user_code);
//!     }
//!     fn confirm_logout(&self, _user_name: &str) -> bool { true }
//! }
//!
//! # async fn example() -> Result<(), orbit::auth::AuthError> {
//! let config = OrbitConfig::from_env();
//! let svc = AuthService::from_config(&config)?;
//! match svc.login(config.client_id.as_deref(), &config.scope, Arc::new(AutoApprove)).await? {
//!     LoginOutcome::LoggedIn { record, .. } => println!("token type {}", record.token_type),
//!     LoginOutcome::Cancelled => {}
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;

#[cfg(feature = "cli")]
pub mod cli;

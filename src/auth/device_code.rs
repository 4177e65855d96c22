use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use strum::{Display, EnumString};

use super::token::TokenRecord;

pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

/// Device authorization issued by the server.
///
/// # Example
/// ```
/// use orbit::auth::DeviceAuthorization;
/// use chrono::Utc;
///
/// let auth = DeviceAuthorization {
///     device_code: "D1".to_string(),
///     user_code: "ABCD-1234".to_string(),
///     verification_uri: "https://x/device".to_string(),
///     verification_uri_complete: "https://x/device?code=ABCD-1234".to_string(),
///     expires_in: 600,
///     interval: 5,
///     issued_at: Utc::now(),
/// };
/// assert!(auth.expires_at() > auth.issued_at);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: String,
    pub expires_in: u64,
    pub interval: u64,
    pub issued_at: DateTime<Utc>,
}

impl DeviceAuthorization {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + chrono::Duration::seconds(self.expires_in as i64)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    expires_in: u64,
    #[serde(default)]
    interval: Option<u64>,
}

impl DeviceCodeResponse {
    pub(crate) fn into_authorization(self, issued_at: DateTime<Utc>) -> DeviceAuthorization {
        let verification_uri_complete = self
            .verification_uri_complete
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| self.verification_uri.clone());
        DeviceAuthorization {
            device_code: self.device_code,
            user_code: self.user_code,
            verification_uri: self.verification_uri,
            verification_uri_complete,
            expires_in: self.expires_in,
            interval: self
                .interval
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            issued_at,
        }
    }
}

/// RFC 8628 error codes returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceFlowErrorCode {
    AuthorizationPending,
    SlowDown,
    AccessDenied,
    ExpiredToken,
    #[strum(default)]
    Other(String),
}

impl DeviceFlowErrorCode {
    /// Never fails: unrecognized codes parse into [`Self::Other`] through the
    /// `#[strum(default)]` variant.
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or(Self::Other(code.to_string()))
    }
}

/// Result of a single exchange attempt against the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCodePoll {
    Pending,
    SlowDown,
    Authorized { token: TokenRecord },
    AccessDenied,
    Expired,
    /// Any other error the server reported. Not retryable.
    Failed { code: String, description: String },
}

impl DeviceCodePoll {
    pub(crate) fn from_error(code: &str, description: Option<String>) -> Self {
        match DeviceFlowErrorCode::from_code(code) {
            DeviceFlowErrorCode::AuthorizationPending => Self::Pending,
            DeviceFlowErrorCode::SlowDown => Self::SlowDown,
            DeviceFlowErrorCode::AccessDenied => Self::AccessDenied,
            DeviceFlowErrorCode::ExpiredToken => Self::Expired,
            DeviceFlowErrorCode::Other(code) => Self::Failed {
                description: description
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| code.clone()),
                code,
            },
        }
    }
}

/// Mutable polling state owned by a single login run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub device_code: String,
    pub client_id: String,
    /// Current wait between attempts. Only ever grows.
    pub interval: Duration,
    /// Sum of all waits performed so far.
    pub elapsed: Duration,
    pub attempts: u32,
    pub terminal: bool,
}

impl PollState {
    pub fn new(authorization: &DeviceAuthorization, client_id: impl Into<String>) -> Self {
        Self {
            device_code: authorization.device_code.clone(),
            client_id: client_id.into(),
            interval: Duration::from_secs(authorization.interval),
            elapsed: Duration::ZERO,
            attempts: 0,
            terminal: false,
        }
    }

    pub fn slow_down(&mut self) {
        self.interval += SLOW_DOWN_INCREMENT;
    }
}

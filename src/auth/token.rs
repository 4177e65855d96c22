use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Credential persisted after a successful device-code exchange.
///
/// The access token is opaque to the client. Its validity is only ever
/// established by the server accepting it in a session lookup.
///
/// # Example
/// ```
/// use orbit::auth::TokenRecord;
///
/// let record = TokenRecord::new("tok_abc", None, Some("openid".to_string()));
/// assert_eq!(record.token_type, "Bearer");
/// assert_eq!(record.authorization_header(), "Bearer tok_abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(
        access_token: impl Into<String>,
        token_type: Option<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(default_token_type),
            scope,
            created_at: Utc::now(),
        }
    }

    /// Value for the `Authorization` header on session and sign-out calls.
    pub fn authorization_header(&self) -> String {
        bearer(&self.access_token)
    }
}

pub(crate) fn bearer(access_token: &str) -> String {
    format!("Bearer {access_token}")
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

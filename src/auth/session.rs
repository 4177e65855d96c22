//! Identity returned by the session endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const FALLBACK_DISPLAY_NAME: &str = "User";

/// Signed-in user as reported by the server. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl SessionUser {
    /// Name, then email, then a generic label.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.email))
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    #[serde(default)]
    pub session: Option<SessionInfo>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

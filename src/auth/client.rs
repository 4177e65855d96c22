//! HTTP transport for the device-authorization endpoints.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::device_code::{
    DeviceAuthorization, DeviceCodePoll, DeviceCodeResponse, DEVICE_CODE_GRANT_TYPE,
};
use super::error::AuthError;
use super::session::Session;
use super::token::{bearer, TokenRecord};
use crate::config::OrbitConfig;

const DEVICE_CODE_PATH: &str = "/api/auth/device/code";
const DEVICE_TOKEN_PATH: &str = "/api/auth/device/token";
const SESSION_PATH: &str = "/api/auth/get-session";
const SIGN_OUT_PATH: &str = "/api/auth/sign-out";
const USER_AGENT: &str = concat!("orbit-cli/", env!("CARGO_PKG_VERSION"));

/// Server operations the login flow depends on.
///
/// Each method performs exactly one request; retry policy belongs to the
/// caller.
#[async_trait]
pub trait DeviceFlowBackend: Send + Sync {
    /// Ask the server for a new device code.
    async fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
    ) -> Result<DeviceAuthorization, AuthError>;

    /// Exchange a device code once. Protocol-level outcomes (pending, denied,
    /// ...) are `Ok`; only transport or decoding failures are `Err`.
    async fn exchange_device_code(
        &self,
        device_code: &str,
        client_id: &str,
    ) -> Result<DeviceCodePoll, AuthError>;

    /// Resolve the identity behind a bearer token.
    async fn get_session(&self, access_token: &str) -> Result<Session, AuthError>;

    /// Revoke the server-side session for a bearer token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Endpoint URLs derived from a server base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFlowEndpoints {
    pub device_code_url: String,
    pub token_url: String,
    pub session_url: String,
    pub sign_out_url: String,
}

impl DeviceFlowEndpoints {
    pub fn for_server(server_url: &str) -> Self {
        let base = server_url.trim_end_matches('/');
        Self {
            device_code_url: format!("{base}{DEVICE_CODE_PATH}"),
            token_url: format!("{base}{DEVICE_TOKEN_PATH}"),
            session_url: format!("{base}{SESSION_PATH}"),
            sign_out_url: format!("{base}{SIGN_OUT_PATH}"),
        }
    }
}

/// reqwest-backed [`DeviceFlowBackend`].
///
/// # Example
/// ```no_run
/// use orbit::auth::{DeviceFlowBackend, HttpDeviceFlowBackend};
///
/// # async fn example() -> Result<(), orbit::auth::AuthError> {
/// let backend = HttpDeviceFlowBackend::new("http://localhost:3005");
/// let auth = backend
///     .request_device_code("my-client", "openid profile email")
///     .await?;
/// println!("Visit {} and enter {}", auth.verification_uri, auth.user_code);
/// # Ok(())
/// # }
/// ```
pub struct HttpDeviceFlowBackend {
    client: reqwest::Client,
    endpoints: DeviceFlowEndpoints,
}

impl HttpDeviceFlowBackend {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints: DeviceFlowEndpoints::for_server(server_url),
        }
    }

    /// Build a backend whose requests time out after `timeout`.
    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints: DeviceFlowEndpoints::for_server(server_url),
        })
    }

    pub fn from_config(config: &OrbitConfig) -> Result<Self, AuthError> {
        Self::with_timeout(&config.server_url, config.http_timeout)
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.device_code_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.token_url = url.into();
        self
    }

    pub fn with_session_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.session_url = url.into();
        self
    }

    pub fn with_sign_out_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.sign_out_url = url.into();
        self
    }

    pub fn endpoints(&self) -> &DeviceFlowEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl DeviceFlowBackend for HttpDeviceFlowBackend {
    async fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(AuthError::MissingClientId);
        }
        tracing::debug!(url = %self.endpoints.device_code_url, "requesting device code");
        let resp = self
            .client
            .post(&self.endpoints.device_code_url)
            .header("Accept", "application/json")
            .json(&json!({ "client_id": client_id, "scope": scope }))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            let payload: DeviceCodeResponse = resp.json().await?;
            return Ok(payload.into_authorization(Utc::now()));
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = ServerErrorBody::parse(&body).describe();
        tracing::debug!(status = %status, detail = ?detail, "device code request rejected");
        match status {
            StatusCode::NOT_FOUND => Err(AuthError::EndpointNotFound),
            StatusCode::BAD_REQUEST => Err(AuthError::BadRequest(
                detail.unwrap_or_else(|| "invalid client_id".to_string()),
            )),
            other => Err(AuthError::RequestFailed {
                status: other.as_u16(),
                message: detail.unwrap_or_else(|| {
                    other
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                }),
            }),
        }
    }

    async fn exchange_device_code(
        &self,
        device_code: &str,
        client_id: &str,
    ) -> Result<DeviceCodePoll, AuthError> {
        let resp = self
            .client
            .post(&self.endpoints.token_url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&json!({
                "grant_type": DEVICE_CODE_GRANT_TYPE,
                "device_code": device_code,
                "client_id": client_id,
            }))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let payload: DeviceTokenResponse = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(AuthError::InvalidResponse(format!(
                    "Device token request failed with status {status}"
                )));
            }
            Err(err) => return Err(AuthError::InvalidResponse(err.to_string())),
        };

        if let Some(access_token) = payload.access_token.filter(|token| !token.is_empty()) {
            return Ok(DeviceCodePoll::Authorized {
                token: TokenRecord::new(access_token, payload.token_type, payload.scope),
            });
        }
        match payload.error {
            Some(code) => Ok(DeviceCodePoll::from_error(&code, payload.error_description)),
            None => Err(AuthError::InvalidResponse(format!(
                "Device token response missing token and error (status {status})"
            ))),
        }
    }

    async fn get_session(&self, access_token: &str) -> Result<Session, AuthError> {
        let resp = self
            .client
            .get(&self.endpoints.session_url)
            .header("Accept", "application/json")
            .header("Authorization", bearer(access_token))
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Session lookup failed with status {status}"
            )));
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(AuthError::Unauthenticated);
        }
        let session: Option<Session> = serde_json::from_str(&body)
            .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
        session.ok_or(AuthError::Unauthenticated)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(&self.endpoints.sign_out_url)
            .header("Accept", "application/json")
            .header("Authorization", bearer(access_token))
            .json(&json!({}))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Sign-out failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct DeviceTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl ServerErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn describe(self) -> Option<String> {
        self.error_description
            .or(self.message)
            .or(self.error)
            .filter(|text| !text.is_empty())
    }
}

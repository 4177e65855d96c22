use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::client::{DeviceFlowBackend, HttpDeviceFlowBackend};
use super::device_code::DeviceAuthorization;
use super::error::AuthError;
use super::poller::{PollObserver, PollProgress, Sleeper, TokenPoller, TokioSleeper};
use super::session::{Session, SessionUser};
use super::store::{FileTokenStore, TokenStore};
use super::token::TokenRecord;
use crate::config::OrbitConfig;

/// User-facing decisions and notifications needed during a flow.
///
/// Implementations own all terminal I/O; [`AuthService`] never prints or
/// exits.
pub trait Interaction: Send + Sync {
    /// A credential is already stored. Return `true` to replace it.
    fn confirm_reauthentication(&self, existing: &TokenRecord) -> bool;

    /// Show the verification URI and user code (and optionally open them).
    fn present_authorization(&self, authorization: &DeviceAuthorization);

    /// Return `true` to proceed with logging `user_name` out.
    fn confirm_logout(&self, user_name: &str) -> bool;

    /// Called before every poll attempt.
    fn on_poll(&self, _progress: PollProgress) {}
}

/// Result of [`AuthService::login`].
#[derive(Debug)]
pub enum LoginOutcome {
    /// The user kept the existing credential.
    Cancelled,
    LoggedIn {
        record: TokenRecord,
        /// `None` when the post-login session lookup failed.
        user: Option<SessionUser>,
        /// Set when the token could not be written to disk.
        persist_error: Option<AuthError>,
    },
}

/// Result of [`AuthService::logout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    NotLoggedIn,
    Cancelled,
    LoggedOut {
        user_name: String,
        remote_signed_out: bool,
        deleted: bool,
    },
}

/// Result of [`AuthService::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    NotLoggedIn,
    /// A token is stored but the server no longer accepts it.
    SessionExpired { record: TokenRecord },
    /// The server could not be asked.
    Unreachable { record: TokenRecord, message: String },
    LoggedIn { user: SessionUser, record: TokenRecord },
}

/// Stored credential plus the identity the server resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub session: Session,
    pub record: TokenRecord,
}

/// Sequences the device flow: stored-credential check, device code, polling,
/// persistence and session lookup.
///
/// # Example
/// ```no_run
/// use orbit::auth::AuthService;
/// use orbit::config::OrbitConfig;
///
/// # async fn example() -> Result<(), orbit::auth::AuthError> {
/// let svc = AuthService::from_config(&OrbitConfig::from_env())?;
/// let identity = svc.whoami().await?;
/// println!("{}", identity.session.user.display_name());
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn DeviceFlowBackend>,
    sleeper: Arc<dyn Sleeper>,
    cancellation: Option<CancellationToken>,
    local_deadline: bool,
}

impl AuthService {
    pub fn new(store: Arc<dyn TokenStore>, backend: Arc<dyn DeviceFlowBackend>) -> Self {
        Self {
            store,
            backend,
            sleeper: Arc::new(TokioSleeper),
            cancellation: None,
            local_deadline: true,
        }
    }

    /// File-backed store and HTTP backend built from `config`.
    pub fn from_config(config: &OrbitConfig) -> Result<Self, AuthError> {
        let store = Arc::new(FileTokenStore::new(config.token_store_config()));
        let backend = Arc::new(HttpDeviceFlowBackend::from_config(config)?);
        Ok(Self::new(store, backend))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_local_deadline(mut self, enabled: bool) -> Self {
        self.local_deadline = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Run the full login flow.
    ///
    /// The client id is checked before anything else. A cancelled token stops
    /// the flow before the device-code request and before the code is shown.
    /// Denied, expired and failed polls are returned as errors and leave
    /// storage untouched. A storage or session-lookup failure after the token
    /// is granted does not fail the login.
    pub async fn login(
        &self,
        client_id: Option<&str>,
        scope: &str,
        interaction: Arc<dyn Interaction>,
    ) -> Result<LoginOutcome, AuthError> {
        let client_id = client_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingClientId)?;

        self.ensure_active()?;

        if let Some(existing) = self.store.load() {
            if !interaction.confirm_reauthentication(&existing) {
                return Ok(LoginOutcome::Cancelled);
            }
        }

        self.ensure_active()?;
        let authorization = self
            .until_cancelled(self.backend.request_device_code(client_id, scope))
            .await?;
        tracing::debug!(
            user_code = %authorization.user_code,
            expires_in = authorization.expires_in,
            interval = authorization.interval,
            "device code issued"
        );
        self.ensure_active()?;
        interaction.present_authorization(&authorization);

        let observer: PollObserver = {
            let interaction = interaction.clone();
            Arc::new(move |progress| interaction.on_poll(progress))
        };
        let mut poller = TokenPoller::new(self.backend.clone())
            .with_sleeper(self.sleeper.clone())
            .with_observer(observer)
            .with_local_deadline(self.local_deadline);
        if let Some(token) = &self.cancellation {
            poller = poller.with_cancellation(token.clone());
        }
        let record = poller.poll(&authorization, client_id).await?;

        let persist_error = match self.store.save(&record) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to store authentication token locally");
                Some(err)
            }
        };

        let user = match self.backend.get_session(&record.access_token).await {
            Ok(session) => Some(session.user),
            Err(err) => {
                tracing::warn!(error = %err, "session lookup after login failed");
                None
            }
        };
        tracing::info!(user = ?user.as_ref().map(SessionUser::display_name), "login complete");

        Ok(LoginOutcome::LoggedIn {
            record,
            user,
            persist_error,
        })
    }

    /// Log out locally, revoking the server session when possible.
    ///
    /// Remote failures never prevent the local record from being deleted.
    pub async fn logout(&self, force: bool, interaction: Arc<dyn Interaction>) -> LogoutOutcome {
        let Some(record) = self.store.load() else {
            return LogoutOutcome::NotLoggedIn;
        };

        let user_name = match self.backend.get_session(&record.access_token).await {
            Ok(session) => session.user.display_name().to_string(),
            Err(err) => {
                tracing::debug!(error = %err, "session lookup before logout failed");
                SessionUser::default().display_name().to_string()
            }
        };

        if !force && !interaction.confirm_logout(&user_name) {
            return LogoutOutcome::Cancelled;
        }

        let remote_signed_out = match self.backend.sign_out(&record.access_token).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "could not revoke session on server");
                false
            }
        };
        let deleted = self.store.delete();

        LogoutOutcome::LoggedOut {
            user_name,
            remote_signed_out,
            deleted,
        }
    }

    /// Report whether the stored credential is still accepted.
    pub async fn status(&self) -> StatusReport {
        let Some(record) = self.store.load() else {
            return StatusReport::NotLoggedIn;
        };
        match self.backend.get_session(&record.access_token).await {
            Ok(session) => StatusReport::LoggedIn {
                user: session.user,
                record,
            },
            Err(AuthError::Unauthenticated) => StatusReport::SessionExpired { record },
            Err(err) => StatusReport::Unreachable {
                record,
                message: err.to_string(),
            },
        }
    }

    /// Resolve the signed-in identity. Fails with `NotLoggedIn` when nothing
    /// is stored.
    pub async fn whoami(&self) -> Result<Identity, AuthError> {
        let record = self.store.load().ok_or(AuthError::NotLoggedIn)?;
        let session = self.backend.get_session(&record.access_token).await?;
        Ok(Identity { session, record })
    }

    fn ensure_active(&self) -> Result<(), AuthError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(AuthError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Race `request` against cancellation. The request is dropped if the
    /// token fires first.
    async fn until_cancelled<T>(
        &self,
        request: impl Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        match &self.cancellation {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(AuthError::Cancelled),
                result = request => result,
            },
            None => request.await,
        }
    }
}

//! Token polling loop for the device-authorization grant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::client::DeviceFlowBackend;
use super::device_code::{DeviceAuthorization, DeviceCodePoll, PollState};
use super::error::AuthError;
use super::token::TokenRecord;

/// Suspension point between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Snapshot handed to the progress observer before each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProgress {
    pub attempt: u32,
    pub interval: Duration,
    pub elapsed: Duration,
}

pub type PollObserver = Arc<dyn Fn(PollProgress) + Send + Sync>;

/// Exchanges a device code for a token until the server grants, denies or
/// expires it.
///
/// Every attempt is preceded by a wait of the current interval, including the
/// first. `slow_down` adds five seconds to the interval for the rest of the
/// run. Denied, expired, unknown server errors and transport failures end the
/// run without retrying.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use orbit::auth::{DeviceFlowBackend, HttpDeviceFlowBackend, TokenPoller};
///
/// # async fn example() -> Result<(), orbit::auth::AuthError> {
/// let backend = Arc::new(HttpDeviceFlowBackend::new("http://localhost:3005"));
/// let auth = backend.request_device_code("my-client", "openid").await?;
/// let token = TokenPoller::new(backend).poll(&auth, "my-client").await?;
/// println!("{}", token.token_type);
/// # Ok(())
/// # }
/// ```
pub struct TokenPoller {
    backend: Arc<dyn DeviceFlowBackend>,
    sleeper: Arc<dyn Sleeper>,
    observer: Option<PollObserver>,
    cancellation: Option<CancellationToken>,
    local_deadline: bool,
}

impl TokenPoller {
    pub fn new(backend: Arc<dyn DeviceFlowBackend>) -> Self {
        Self {
            backend,
            sleeper: Arc::new(TokioSleeper),
            observer: None,
            cancellation: None,
            local_deadline: true,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_observer(mut self, observer: PollObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// When enabled (the default), stop with [`AuthError::ExpiredToken`] once
    /// the waited time reaches the code's `expires_in`, without asking the
    /// server again.
    pub fn with_local_deadline(mut self, enabled: bool) -> Self {
        self.local_deadline = enabled;
        self
    }

    /// Poll until a terminal state is reached.
    pub async fn poll(
        &self,
        authorization: &DeviceAuthorization,
        client_id: &str,
    ) -> Result<TokenRecord, AuthError> {
        let mut state = PollState::new(authorization, client_id);
        let result = self.run(&mut state, authorization.lifetime()).await;
        state.terminal = true;
        match &result {
            Ok(_) => tracing::debug!(attempts = state.attempts, "device code granted"),
            Err(err) => tracing::debug!(attempts = state.attempts, error = %err, "polling stopped"),
        }
        result
    }

    /// Drive `state` until a terminal outcome. Exposed so callers can inspect
    /// the final interval and attempt count.
    pub async fn run(
        &self,
        state: &mut PollState,
        lifetime: Duration,
    ) -> Result<TokenRecord, AuthError> {
        loop {
            self.ensure_active()?;
            self.wait(state.interval).await?;
            state.elapsed += state.interval;

            if self.local_deadline && state.elapsed >= lifetime {
                state.terminal = true;
                return Err(AuthError::ExpiredToken);
            }

            self.ensure_active()?;
            state.attempts += 1;
            if let Some(observer) = &self.observer {
                observer(PollProgress {
                    attempt: state.attempts,
                    interval: state.interval,
                    elapsed: state.elapsed,
                });
            }
            tracing::debug!(
                attempt = state.attempts,
                interval_secs = state.interval.as_secs(),
                "polling token endpoint"
            );

            let outcome = self
                .backend
                .exchange_device_code(&state.device_code, &state.client_id)
                .await;
            let poll = match outcome {
                Ok(poll) => poll,
                Err(err) => {
                    state.terminal = true;
                    return Err(err);
                }
            };

            match poll {
                DeviceCodePoll::Authorized { token } => {
                    state.terminal = true;
                    return Ok(token);
                }
                DeviceCodePoll::Pending => {}
                DeviceCodePoll::SlowDown => {
                    state.slow_down();
                    tracing::debug!(
                        interval_secs = state.interval.as_secs(),
                        "server asked to slow down"
                    );
                }
                DeviceCodePoll::AccessDenied => {
                    state.terminal = true;
                    return Err(AuthError::AccessDenied);
                }
                DeviceCodePoll::Expired => {
                    state.terminal = true;
                    return Err(AuthError::ExpiredToken);
                }
                DeviceCodePoll::Failed { code, description } => {
                    state.terminal = true;
                    return Err(AuthError::Server { code, description });
                }
            }
        }
    }

    fn ensure_active(&self) -> Result<(), AuthError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(AuthError::Cancelled),
            _ => Ok(()),
        }
    }

    async fn wait(&self, duration: Duration) -> Result<(), AuthError> {
        match &self.cancellation {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(AuthError::Cancelled),
                _ = self.sleeper.sleep(duration) => Ok(()),
            },
            None => {
                self.sleeper.sleep(duration).await;
                Ok(())
            }
        }
    }
}

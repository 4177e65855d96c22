#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use orbit::auth::{
    AuthError, DeviceAuthorization, DeviceCodePoll, DeviceFlowBackend, Interaction, PollProgress,
    Session, SessionUser, Sleeper, TokenRecord, TokenStore,
};

#[derive(Default)]
pub struct InMemoryTokenStore {
    record: Mutex<Option<TokenRecord>>,
    fail_saves: AtomicBool,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        store
    }

    pub fn seed(&self, record: TokenRecord) {
        *self.record.lock().expect("store lock poisoned") = Some(record);
    }

    pub fn get(&self) -> Option<TokenRecord> {
        self.record.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        self.get()
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AuthError::Io("read-only file system".to_string()));
        }
        *self.record.lock().expect("store lock poisoned") = Some(record.clone());
        Ok(())
    }

    fn delete(&self) -> bool {
        self.record.lock().expect("store lock poisoned").take().is_some()
    }
}

/// Records every requested wait and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("sleeper lock poisoned").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits
            .lock()
            .expect("sleeper lock poisoned")
            .push(duration);
    }
}

/// Backend that replays scripted poll results.
pub struct ScriptedBackend {
    authorization: Mutex<Option<Result<DeviceAuthorization, AuthError>>>,
    polls: Mutex<VecDeque<Result<DeviceCodePoll, AuthError>>>,
    session: Mutex<Option<Result<Session, AuthError>>>,
    sign_out_fails: AtomicBool,
    device_code_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(polls: Vec<Result<DeviceCodePoll, AuthError>>) -> Self {
        Self {
            authorization: Mutex::new(Some(Ok(authorization(5, 600)))),
            polls: Mutex::new(polls.into()),
            session: Mutex::new(Some(Ok(session("Ada", "ada@example.com")))),
            sign_out_fails: AtomicBool::new(false),
            device_code_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_authorization(self, result: Result<DeviceAuthorization, AuthError>) -> Self {
        *self.authorization.lock().expect("lock") = Some(result);
        self
    }

    pub fn with_session(self, result: Result<Session, AuthError>) -> Self {
        *self.session.lock().expect("lock") = Some(result);
        self
    }

    pub fn with_failing_sign_out(self) -> Self {
        self.sign_out_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn device_code_calls(&self) -> usize {
        self.device_code_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceFlowBackend for ScriptedBackend {
    async fn request_device_code(
        &self,
        _client_id: &str,
        _scope: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        self.device_code_calls.fetch_add(1, Ordering::SeqCst);
        self.authorization
            .lock()
            .expect("lock")
            .take()
            .unwrap_or_else(|| Err(AuthError::Network("no scripted authorization".into())))
    }

    async fn exchange_device_code(
        &self,
        device_code: &str,
        _client_id: &str,
    ) -> Result<DeviceCodePoll, AuthError> {
        assert_eq!(device_code, "D1");
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| panic!("poll attempted after script ended"))
    }

    async fn get_session(&self, _access_token: &str) -> Result<Session, AuthError> {
        match self.session.lock().expect("lock").as_ref() {
            Some(Ok(session)) => Ok(session.clone()),
            Some(Err(AuthError::Unauthenticated)) | None => Err(AuthError::Unauthenticated),
            Some(Err(err)) => Err(AuthError::Network(err.to_string())),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(AuthError::Network("connection refused".into()));
        }
        Ok(())
    }
}

/// Interaction with fixed answers that records what it was shown.
pub struct ScriptedInteraction {
    pub reauthenticate: bool,
    pub logout: bool,
    presented: Mutex<Vec<DeviceAuthorization>>,
    progress: Mutex<Vec<PollProgress>>,
    reauth_prompts: AtomicUsize,
    logout_prompts: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    pub fn answering(reauthenticate: bool, logout: bool) -> Self {
        Self {
            reauthenticate,
            logout,
            presented: Mutex::new(Vec::new()),
            progress: Mutex::new(Vec::new()),
            reauth_prompts: AtomicUsize::new(0),
            logout_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn presented(&self) -> Vec<DeviceAuthorization> {
        self.presented.lock().expect("lock").clone()
    }

    pub fn progress(&self) -> Vec<PollProgress> {
        self.progress.lock().expect("lock").clone()
    }

    pub fn reauth_prompts(&self) -> usize {
        self.reauth_prompts.load(Ordering::SeqCst)
    }

    pub fn logout_prompts(&self) -> Vec<String> {
        self.logout_prompts.lock().expect("lock").clone()
    }
}

impl Interaction for ScriptedInteraction {
    fn confirm_reauthentication(&self, _existing: &TokenRecord) -> bool {
        self.reauth_prompts.fetch_add(1, Ordering::SeqCst);
        self.reauthenticate
    }

    fn present_authorization(&self, authorization: &DeviceAuthorization) {
        self.presented
            .lock()
            .expect("lock")
            .push(authorization.clone());
    }

    fn confirm_logout(&self, user_name: &str) -> bool {
        self.logout_prompts
            .lock()
            .expect("lock")
            .push(user_name.to_string());
        self.logout
    }

    fn on_poll(&self, progress: PollProgress) {
        self.progress.lock().expect("lock").push(progress);
    }
}

pub fn authorization(interval: u64, expires_in: u64) -> DeviceAuthorization {
    DeviceAuthorization {
        device_code: "D1".to_string(),
        user_code: "ABCD-1234".to_string(),
        verification_uri: "https://x/device".to_string(),
        verification_uri_complete: "https://x/device?code=ABCD-1234".to_string(),
        expires_in,
        interval,
        issued_at: Utc::now(),
    }
}

pub fn record(access_token: &str) -> TokenRecord {
    TokenRecord::new(access_token, None, Some("openid".to_string()))
}

pub fn granted(access_token: &str) -> Result<DeviceCodePoll, AuthError> {
    Ok(DeviceCodePoll::Authorized {
        token: record(access_token),
    })
}

pub fn session(name: &str, email: &str) -> Session {
    Session {
        user: SessionUser {
            id: Some("user-1".to_string()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            image: None,
        },
        session: None,
    }
}

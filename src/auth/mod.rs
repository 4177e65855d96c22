//! OAuth device-authorization flow, token storage, and session lookup.

pub mod client;
pub mod device_code;
pub mod error;
pub mod poller;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use client::{DeviceFlowBackend, DeviceFlowEndpoints, HttpDeviceFlowBackend};
pub use device_code::{DeviceAuthorization, DeviceCodePoll, DeviceFlowErrorCode, PollState};
pub use error::{AuthError, ErrorCategory};
pub use poller::{PollObserver, PollProgress, Sleeper, TokenPoller, TokioSleeper};
pub use service::{AuthService, Identity, Interaction, LoginOutcome, LogoutOutcome, StatusReport};
pub use session::{Session, SessionInfo, SessionUser};
pub use store::{FileTokenStore, TokenStore, TokenStoreConfig};
pub use token::TokenRecord;

//! Rented number sessions: state machine, expiry timers and price cache.

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod manager;
pub(crate) mod model;
pub(crate) mod price_cache;
pub(crate) mod scheduler;
pub(crate) mod store;
pub(crate) mod traits;

pub use config::{
    BalancePolicy, DEFAULT_PRICE_TTL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SESSION_TIMEOUT,
    PriceResolution, SessionManagerConfig, SessionManagerConfigBuilder,
};
pub use error::{ConfigError, SessionError};
pub use manager::{
    Ack, PollReport, PollStatus, SessionHandle, SessionManager, SessionManagerBuilder,
    SessionStats,
};
pub use model::{ReceivedCode, Session, SessionState};
pub use traits::SessionManagerTrait;

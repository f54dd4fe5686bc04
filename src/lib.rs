//! # SMS Sessions
//!
//! Lifecycle management for rented SMS verification numbers.
//!
//! A [`SessionManager`] rents numbers from a [`Provider`], polls them for
//! delivered codes, suppresses repeat deliveries, optionally asks for more
//! codes on the same number, cancels numbers that never received a code, and
//! keeps a short-lived cache of rental prices.
//!
//! ## Supported Providers
//!
//! | Provider | Feature | Website |
//! |----------|---------|---------|
//! | Hero SMS | `hero-sms` (default) | <https://hero-sms.com> |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
//! use sms_sessions::{
//!     PollStatus, SessionManager, SessionManagerConfig, SessionManagerTrait,
//!     SmsRetryableProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HeroSms::with_api_key("your_api_key")?;
//!     let provider = SmsRetryableProvider::new(HeroSmsProvider::new(client));
//!
//!     let manager = SessionManager::builder(provider)
//!         .config(SessionManagerConfig::from_env()?)
//!         .build();
//!
//!     let handle = manager.acquire_default().await?;
//!     println!("Number: {} (price {})", handle.phone_number, handle.price);
//!
//!     let report = manager.poll(&handle.session_id).await?;
//!     if report.status == PollStatus::CodeReceived {
//!         println!("Code: {}", report.code.unwrap());
//!         manager.finish(&handle.session_id).await;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SessionManager<P>
//!   ├── SessionStore      (per-id locks, succeeded set)
//!   ├── TimeoutScheduler  (one expiry timer per session)
//!   ├── PriceCache        (TTL, single-flight refresh)
//!   ▼
//! SmsRetryableProvider<P>  (optional retry wrapper)
//!         │
//!         ▼
//!     Provider             (trait: HeroSmsProvider, etc.)
//! ```
//!
//! ## Features
//!
//! - `hero-sms` - Hero SMS provider support (enabled by default)
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)

pub mod errors;
pub mod providers;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use errors::{ErrorCategory, GatewayError, RetryableError};
pub use providers::{
    Acquisition, CodeStatus, OnRetryCallback, Provider, SmsRetryableProvider, StatusUpdate,
};
pub use session::{
    Ack, BalancePolicy, ConfigError, PollReport, PollStatus, PriceResolution, ReceivedCode,
    Session, SessionError, SessionHandle, SessionManager, SessionManagerBuilder,
    SessionManagerConfig, SessionManagerConfigBuilder, SessionManagerTrait, SessionState,
    SessionStats,
};
pub use types::{
    CountryId, DialCode, DialCodeError, FullNumber, Number, NumberError, Price, PriceError,
    Service, SessionId, SmsCode,
};
pub use utils::{RetryConfig, dial_code_for};

// Re-export keshvar for ISO country lookups
pub use keshvar::Alpha2;

#[cfg(feature = "hero-sms")]
pub use providers::hero_sms;

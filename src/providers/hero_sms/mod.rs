//! Hero SMS provider implementation.
//!
//! Integration with the Hero SMS handler API
//! (`https://hero-sms.com/stubs/handler_api.php`).
//!
//! # Example
//!
//! ```rust,ignore
//! use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
//! use sms_sessions::{SessionManager, SessionManagerConfig, SmsRetryableProvider};
//!
//! let client = HeroSms::with_api_key("your_api_key")?;
//! let provider = SmsRetryableProvider::new(HeroSmsProvider::new(client));
//!
//! let manager = SessionManager::builder(provider)
//!     .config(SessionManagerConfig::default())
//!     .build();
//!
//! let handle = manager.acquire_default().await?;
//! println!("Got number: {}", handle.phone_number);
//!
//! let report = manager.poll(&handle.session_id).await?;
//! println!("Status: {:?}", report.status);
//! ```

pub mod client;
pub mod errors;
mod prices;
pub mod provider;
mod response;
pub mod types;

// Re-export commonly used types
pub use client::HeroSms;
pub use errors::HeroSmsError;
pub use prices::extract_price;
pub use provider::HeroSmsProvider;

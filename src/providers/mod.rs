//! SMS provider implementations.

pub(crate) mod retryable;
pub(crate) mod traits;

#[cfg(feature = "hero-sms")]
pub mod hero_sms;

pub use retryable::{OnRetryCallback, SmsRetryableProvider};
pub use traits::{Acquisition, CodeStatus, Provider, StatusUpdate};

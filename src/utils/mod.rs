//! Shared helpers.

pub(crate) mod dial_code;
pub(crate) mod retry;

pub use dial_code::dial_code_for;
pub use retry::RetryConfig;

//! Error classification traits shared by providers and the session core.

/// Trait for errors that can be classified as retryable or permanent.
///
/// Two levels of retryability are distinguished:
///
/// 1. **Call-level** (`is_retryable`): whether the same remote call may be repeated.
///    Network timeouts and transient server errors fall here.
///
/// 2. **Operation-level** (`should_retry_operation`): whether a fresh attempt
///    (renting another number) might succeed even though this one failed.
///
/// # Examples
///
/// ```rust
/// use sms_sessions::RetryableError;
///
/// enum MyError {
///     NetworkTimeout,
///     NoNumbers,
///     InvalidApiKey,
/// }
///
/// impl RetryableError for MyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, MyError::NetworkTimeout)
///     }
///
///     fn should_retry_operation(&self) -> bool {
///         !matches!(self, MyError::InvalidApiKey)
///     }
/// }
/// ```
pub trait RetryableError {
    /// Returns true if this error represents a transient failure
    /// that might succeed when the same call is repeated.
    fn is_retryable(&self) -> bool;

    /// Returns true if a fresh operation (renting a new number) might succeed.
    ///
    /// Default implementation returns the same as `is_retryable()`.
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }
}

/// Coarse outcome class of a provider failure.
///
/// The session core branches on this instead of on provider-specific codes,
/// so the "no numbers", "no balance" and "bad credentials" outcomes of an
/// acquisition are never confused with each other or with transport faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The provider could not be reached or did not answer in time.
    Network,
    /// No numbers are available for the requested service and country.
    NoNumbers,
    /// The provider account cannot pay for the rental.
    NoBalance,
    /// The provider rejected the credentials.
    BadKey,
    /// Anything else: malformed payloads, unknown tokens, rejected requests.
    Other,
}

/// Error type of a [`Provider`](crate::Provider).
///
/// Every provider error is retry-classified and maps to an [`ErrorCategory`].
pub trait GatewayError: RetryableError {
    /// Classify this error for the session core.
    fn category(&self) -> ErrorCategory;
}

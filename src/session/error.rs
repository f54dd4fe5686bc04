//! Session-level error types.

use crate::errors::{ErrorCategory, GatewayError, RetryableError};
use crate::types::{CountryId, Price, Service};
use std::error::Error as StdError;
use thiserror::Error;

/// Failures of the session manager's operations.
///
/// An unknown session id is not an error: polls report it as
/// [`PollStatus::NotFound`](crate::PollStatus::NotFound) and cancel/finish
/// acknowledge it as inactive.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The account balance does not satisfy the configured policy.
    #[error("Insufficient balance: {balance} available, {required} required")]
    InsufficientBalance { balance: Price, required: Price },

    /// The provider has no numbers for the service and country.
    #[error("No numbers available for service {service} in country {country}")]
    NoNumbersAvailable { service: Service, country: CountryId },

    /// The provider rejected the credentials.
    #[error("Provider rejected the credentials")]
    InvalidCredentials,

    /// The provider could not be reached or did not answer in time.
    #[error("Provider unavailable during {operation}: {message}")]
    RemoteUnavailable {
        operation: &'static str,
        message: String,
    },

    /// Any other provider failure.
    #[error("SMS provider error: {source}")]
    Provider {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        /// Whether the same call can be retried.
        is_retryable: bool,
        /// Whether a fresh operation might succeed.
        should_retry_operation: bool,
    },

    /// Two acquisitions returned the same id.
    #[error("Provider issued an id already in use: {session_id}")]
    DuplicateSession { session_id: String },

    /// The manager was shut down; no new numbers are rented.
    #[error("Session manager is shut down")]
    ShutDown,
}

impl SessionError {
    /// Convert a provider error into its typed outcome.
    pub(crate) fn from_gateway<E>(
        error: E,
        operation: &'static str,
        service: &Service,
        country: CountryId,
    ) -> Self
    where
        E: StdError + GatewayError + Send + Sync + 'static,
    {
        match error.category() {
            ErrorCategory::Network => SessionError::RemoteUnavailable {
                operation,
                message: error.to_string(),
            },
            ErrorCategory::NoNumbers => SessionError::NoNumbersAvailable {
                service: service.clone(),
                country,
            },
            ErrorCategory::NoBalance => SessionError::InsufficientBalance {
                balance: Price::ZERO,
                required: Price::ZERO,
            },
            ErrorCategory::BadKey => SessionError::InvalidCredentials,
            ErrorCategory::Other => {
                let is_retryable = error.is_retryable();
                let should_retry_operation = error.should_retry_operation();
                SessionError::Provider {
                    source: Box::new(error),
                    is_retryable,
                    should_retry_operation,
                }
            }
        }
    }

    pub(crate) fn timed_out(operation: &'static str) -> Self {
        SessionError::RemoteUnavailable {
            operation,
            message: "request timed out".to_string(),
        }
    }
}

impl RetryableError for SessionError {
    fn is_retryable(&self) -> bool {
        match self {
            SessionError::RemoteUnavailable { .. } => true,
            SessionError::Provider { is_retryable, .. } => *is_retryable,
            SessionError::InsufficientBalance { .. }
            | SessionError::NoNumbersAvailable { .. }
            | SessionError::InvalidCredentials
            | SessionError::DuplicateSession { .. }
            | SessionError::ShutDown => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            SessionError::RemoteUnavailable { .. } => true,
            SessionError::NoNumbersAvailable { .. } => true,
            SessionError::DuplicateSession { .. } => true,
            SessionError::Provider {
                should_retry_operation,
                ..
            } => *should_retry_operation,
            SessionError::InsufficientBalance { .. }
            | SessionError::InvalidCredentials
            | SessionError::ShutDown => false,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("{0:?}")]
    struct Classified(ErrorCategory);

    impl RetryableError for Classified {
        fn is_retryable(&self) -> bool {
            self.0 == ErrorCategory::Network
        }
    }

    impl GatewayError for Classified {
        fn category(&self) -> ErrorCategory {
            self.0
        }
    }

    fn convert(category: ErrorCategory) -> SessionError {
        SessionError::from_gateway(
            Classified(category),
            "acquire_number",
            &Service::Microsoft,
            CountryId::new(73),
        )
    }

    #[test]
    fn test_categories_map_to_distinct_outcomes() {
        assert!(matches!(
            convert(ErrorCategory::Network),
            SessionError::RemoteUnavailable {
                operation: "acquire_number",
                ..
            }
        ));
        assert!(matches!(
            convert(ErrorCategory::NoNumbers),
            SessionError::NoNumbersAvailable { .. }
        ));
        assert!(matches!(
            convert(ErrorCategory::NoBalance),
            SessionError::InsufficientBalance { .. }
        ));
        assert!(matches!(
            convert(ErrorCategory::BadKey),
            SessionError::InvalidCredentials
        ));
        assert!(matches!(
            convert(ErrorCategory::Other),
            SessionError::Provider { .. }
        ));
    }

    #[test]
    fn test_acquire_outcomes_are_terminal() {
        assert!(!convert(ErrorCategory::NoNumbers).is_retryable());
        assert!(!convert(ErrorCategory::NoBalance).is_retryable());
        assert!(!convert(ErrorCategory::BadKey).should_retry_operation());
        assert!(SessionError::timed_out("get_code").is_retryable());
        assert!(!SessionError::ShutDown.is_retryable());
        assert!(!SessionError::ShutDown.should_retry_operation());
    }
}

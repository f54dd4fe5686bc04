//! Retryable provider wrapper.

use super::traits::{Acquisition, CodeStatus, Provider, StatusUpdate};
use crate::errors::RetryableError;
use crate::types::{CountryId, Price, Service, SessionId};
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Callback type for retry notifications.
///
/// Invoked each time a retry is attempted with the error that caused it and
/// the delay until the next attempt.
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::SmsRetryableProvider;
///
/// let provider = SmsRetryableProvider::new(base_provider)
///     .with_on_retry(|error, duration| {
///         println!("Retrying after {:?} due to: {}", duration, error);
///     });
/// ```
pub type OnRetryCallback<E> = Arc<dyn Fn(&E, Duration) + Send + Sync>;

/// Wrapper that adds automatic retry logic to any Provider.
///
/// Read-only calls (`get_balance`, `get_price`, `get_code`) are repeated on
/// errors whose `is_retryable()` is true. `acquire_number` and `set_status`
/// change provider state and pass straight through: repeating a rental that
/// timed out could rent a second number.
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
/// use sms_sessions::{RetryConfig, SmsRetryableProvider};
/// use std::time::Duration;
///
/// let base_provider = HeroSmsProvider::new(HeroSms::with_api_key("api_key")?);
///
/// let custom_config = RetryConfig::default()
///     .with_max_retries(3)
///     .with_min_delay(Duration::from_millis(200));
/// let provider = SmsRetryableProvider::with_config(base_provider, custom_config);
/// ```
pub struct SmsRetryableProvider<P: Provider> {
    inner: Arc<P>,
    retry_config: RetryConfig,
    on_retry: Option<OnRetryCallback<P::Error>>,
}

impl<P: Provider> Clone for SmsRetryableProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_config: self.retry_config.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<P: Provider + Debug> Debug for SmsRetryableProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsRetryableProvider")
            .field("inner", &self.inner)
            .field("retry_config", &self.retry_config)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<P: Provider> SmsRetryableProvider<P> {
    /// Wrap a provider with default retry logic.
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    /// Wrap a provider with custom retry configuration.
    pub fn with_config(inner: P, retry_config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_config,
            on_retry: None,
        }
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&P::Error, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Get reference to the inner provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get reference to the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

impl<P: Provider> Provider for SmsRetryableProvider<P>
where
    P::Error: Debug,
{
    type Error = P::Error;

    async fn get_balance(&self) -> Result<Price, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let on_retry = self.on_retry.clone();
        (|| {
            let inner = Arc::clone(&inner);
            async move { inner.get_balance().await }
        })
        .retry(self.retry_config.build_strategy())
        .when(|err: &Self::Error| err.is_retryable())
        .notify(move |err, duration| {
            if let Some(ref callback) = on_retry {
                callback(err, duration);
            }

            #[cfg(feature = "tracing")]
            debug!(
                error = ?err,
                retry_after_secs = %duration.as_secs_f64(),
                "Retrying get_balance"
            );
        })
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsRetryableProvider::get_price",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    async fn get_price(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<Option<Price>, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let service = service.clone();
        let on_retry = self.on_retry.clone();
        (|| {
            let inner = Arc::clone(&inner);
            let service = service.clone();
            async move { inner.get_price(&service, country).await }
        })
        .retry(self.retry_config.build_strategy())
        .when(|err: &Self::Error| err.is_retryable())
        .notify(move |err, duration| {
            if let Some(ref callback) = on_retry {
                callback(err, duration);
            }

            #[cfg(feature = "tracing")]
            debug!(
                error = ?err,
                retry_after_secs = %duration.as_secs_f64(),
                "Retrying get_price"
            );
        })
        .await
    }

    async fn acquire_number(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<Acquisition, Self::Error> {
        self.inner.acquire_number(service, country).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsRetryableProvider::get_code",
            skip_all,
            fields(session_id = %session_id)
        )
    )]
    async fn get_code(&self, session_id: &SessionId) -> Result<CodeStatus, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let session_id_owned = session_id.clone();
        let on_retry = self.on_retry.clone();
        (|| {
            let inner = Arc::clone(&inner);
            let session_id = session_id_owned.clone();
            async move { inner.get_code(&session_id).await }
        })
        .retry(self.retry_config.build_strategy())
        .when(|err: &Self::Error| err.is_retryable())
        .notify(move |err, duration| {
            if let Some(ref callback) = on_retry {
                callback(err, duration);
            }

            #[cfg(feature = "tracing")]
            debug!(
                error = ?err,
                retry_after_secs = %duration.as_secs_f64(),
                "Retrying get_code"
            );
        })
        .await
    }

    async fn set_status(
        &self,
        session_id: &SessionId,
        update: StatusUpdate,
    ) -> Result<(), Self::Error> {
        self.inner.set_status(session_id, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCategory, GatewayError};
    use crate::types::FullNumber;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
    }

    impl RetryableError for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    impl GatewayError for TestError {
        fn category(&self) -> ErrorCategory {
            match self {
                TestError::Transient => ErrorCategory::Network,
                TestError::Fatal => ErrorCategory::Other,
            }
        }
    }

    /// Fails the first `failures` calls of every operation with `Transient`,
    /// or always with `Fatal` when `fatal` is set.
    #[derive(Clone, Default)]
    struct FlakyProvider {
        failures: usize,
        fatal: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FlakyProvider {
        fn attempt(&self) -> Result<(), TestError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fatal {
                Err(TestError::Fatal)
            } else if n < self.failures {
                Err(TestError::Transient)
            } else {
                Ok(())
            }
        }
    }

    impl Provider for FlakyProvider {
        type Error = TestError;

        async fn get_balance(&self) -> Result<Price, TestError> {
            self.attempt().map(|_| Price::new(1.0).unwrap())
        }

        async fn get_price(
            &self,
            _service: &Service,
            _country: CountryId,
        ) -> Result<Option<Price>, TestError> {
            self.attempt().map(|_| Price::new(0.25).ok())
        }

        async fn acquire_number(
            &self,
            _service: &Service,
            _country: CountryId,
        ) -> Result<Acquisition, TestError> {
            self.attempt().map(|_| Acquisition {
                session_id: SessionId::from("1"),
                full_number: FullNumber::from("5511999990000"),
                allows_multiple_codes: false,
                cost: None,
            })
        }

        async fn get_code(&self, _session_id: &SessionId) -> Result<CodeStatus, TestError> {
            self.attempt().map(|_| CodeStatus::Waiting)
        }

        async fn set_status(
            &self,
            _session_id: &SessionId,
            _update: StatusUpdate,
        ) -> Result<(), TestError> {
            self.attempt()
        }
    }

    fn fast_retries() -> RetryConfig {
        RetryConfig::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
            .with_max_retries(3)
    }

    #[tokio::test]
    async fn test_read_calls_are_retried() {
        let base = FlakyProvider {
            failures: 2,
            ..Default::default()
        };
        let calls = Arc::clone(&base.calls);
        let provider = SmsRetryableProvider::with_config(base, fast_retries());

        let status = provider.get_code(&SessionId::from("1")).await.unwrap();
        assert_eq!(status, CodeStatus::Waiting);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let base = FlakyProvider {
            failures: 10,
            ..Default::default()
        };
        let calls = Arc::clone(&base.calls);
        let provider = SmsRetryableProvider::with_config(base, fast_retries());

        assert!(provider.get_balance().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let base = FlakyProvider {
            fatal: true,
            ..Default::default()
        };
        let calls = Arc::clone(&base.calls);
        let provider = SmsRetryableProvider::with_config(base, fast_retries());

        let err = provider
            .get_price(&Service::Microsoft, CountryId::new(73))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_changing_calls_pass_through() {
        let base = FlakyProvider {
            failures: 1,
            ..Default::default()
        };
        let calls = Arc::clone(&base.calls);
        let provider = SmsRetryableProvider::with_config(base, fast_retries());

        assert!(
            provider
                .acquire_number(&Service::Microsoft, CountryId::new(73))
                .await
                .is_err()
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        provider
            .set_status(&SessionId::from("1"), StatusUpdate::Cancel)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_on_retry_callback_invoked() {
        let base = FlakyProvider {
            failures: 2,
            ..Default::default()
        };
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let provider = SmsRetryableProvider::with_config(base, fast_retries()).with_on_retry(
            move |_err, _delay| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        provider.get_balance().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }
}

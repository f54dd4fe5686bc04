//! Session manager configuration.

use super::error::ConfigError;
use crate::types::{CountryId, DialCode, Price, Service};
use std::str::FromStr;
use std::time::Duration;

/// Default time a number may sit without a code before it is cancelled.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(50);
/// Default freshness window of a cached price.
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(30);
/// Default bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Balance precondition checked before renting a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalancePolicy {
    /// Balance must be at least `threshold`.
    Minimum { threshold: Price },
    /// Balance must cover the current price plus `margin`.
    PriceWithMargin { margin: Price },
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self::Minimum {
            threshold: Price::new(0.01).unwrap_or(Price::ZERO),
        }
    }
}

/// When the rental price of a new session is looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceResolution {
    /// Before the handle is returned.
    #[default]
    Synchronous,
    /// In the background; the handle carries a zero placeholder.
    Deferred,
}

/// Configuration for the [`SessionManager`](crate::SessionManager).
///
/// ```rust
/// use sms_sessions::{CountryId, Service, SessionManagerConfig};
/// use std::time::Duration;
///
/// let config = SessionManagerConfig::builder()
///     .service(Service::Whatsapp)
///     .country(CountryId::new(73))
///     .session_timeout(Duration::from_secs(120))
///     .build();
///
/// assert_eq!(config.session_timeout, Duration::from_secs(120));
/// assert_eq!(config.price_ttl, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Service numbers are rented for by default.
    pub service: Service,
    /// Provider country id used by default.
    pub country: CountryId,
    /// Dial code stripped from numbers of `country` for display.
    pub dial_code: Option<DialCode>,
    /// Time a session may wait for its first code (default: 50 seconds).
    pub session_timeout: Duration,
    /// Price cache freshness (default: 30 seconds).
    pub price_ttl: Duration,
    /// Bound on every provider call (default: 10 seconds).
    pub request_timeout: Duration,
    pub balance_policy: BalancePolicy,
    pub price_resolution: PriceResolution,
    /// Ask for another code after each delivery when the number allows it.
    pub request_additional_codes: bool,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            service: Service::Microsoft,
            country: CountryId::new(73),
            dial_code: DialCode::new("55").ok(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            price_ttl: DEFAULT_PRICE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            balance_policy: BalancePolicy::default(),
            price_resolution: PriceResolution::Synchronous,
            request_additional_codes: true,
        }
    }
}

impl SessionManagerConfig {
    pub fn builder() -> SessionManagerConfigBuilder {
        SessionManagerConfigBuilder::default()
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_price_ttl(mut self, ttl: Duration) -> Self {
        self.price_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_balance_policy(mut self, policy: BalancePolicy) -> Self {
        self.balance_policy = policy;
        self
    }

    pub fn with_price_resolution(mut self, resolution: PriceResolution) -> Self {
        self.price_resolution = resolution;
        self
    }

    pub fn with_request_additional_codes(mut self, enabled: bool) -> Self {
        self.request_additional_codes = enabled;
        self
    }

    /// Short timers for interactive use: 30s session timeout, 5s requests.
    pub fn fast() -> Self {
        Self::default()
            .with_session_timeout(Duration::from_secs(30))
            .with_request_timeout(Duration::from_secs(5))
    }

    /// Long timers for slow-delivering services: 5 minute session timeout.
    pub fn patient() -> Self {
        Self::default()
            .with_session_timeout(Duration::from_secs(300))
            .with_request_timeout(Duration::from_secs(20))
    }

    /// Dial code to strip from numbers rented in `country`.
    pub(crate) fn dial_code_for(&self, country: CountryId) -> Option<&DialCode> {
        (country == self.country)
            .then_some(self.dial_code.as_ref())
            .flatten()
    }

    /// Load from `SMS_*` environment variables, falling back to defaults.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `SMS_SERVICE` | service code, e.g. `mm` |
    /// | `SMS_COUNTRY_ID` | provider country id |
    /// | `SMS_DIAL_CODE` | dial code stripped for display |
    /// | `SMS_TIMEOUT_SECS` | session timeout |
    /// | `SMS_PRICE_TTL_SECS` | price cache TTL |
    /// | `SMS_REQUEST_TIMEOUT_SECS` | per-call timeout |
    /// | `SMS_MIN_BALANCE` | minimum balance policy threshold |
    /// | `SMS_PRICE_MARGIN` | switches to the price-plus-margin policy |
    /// | `SMS_REQUEST_ADDITIONAL_CODES` | `true` / `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("SMS_SERVICE") {
            config.service = Service::from_code(raw);
        }
        if let Some(id) = parse_var::<u16>(&lookup, "SMS_COUNTRY_ID")? {
            config.country = CountryId::new(id);
        }
        if let Some(raw) = lookup("SMS_DIAL_CODE") {
            config.dial_code = if raw.trim().is_empty() {
                None
            } else {
                Some(DialCode::new(&raw).map_err(|e| ConfigError::InvalidValue {
                    key: "SMS_DIAL_CODE",
                    value: raw.clone(),
                    message: e.to_string(),
                })?)
            };
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SMS_TIMEOUT_SECS")? {
            config.session_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SMS_PRICE_TTL_SECS")? {
            config.price_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SMS_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var::<Price>(&lookup, "SMS_MIN_BALANCE")? {
            config.balance_policy = BalancePolicy::Minimum { threshold };
        }
        if let Some(margin) = parse_var::<Price>(&lookup, "SMS_PRICE_MARGIN")? {
            config.balance_policy = BalancePolicy::PriceWithMargin { margin };
        }
        if let Some(enabled) = parse_var::<bool>(&lookup, "SMS_REQUEST_ADDITIONAL_CODES")? {
            config.request_additional_codes = enabled;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject durations that would make every call or session fail at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("session_timeout", self.session_timeout),
            ("request_timeout", self.request_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { key });
            }
        }
        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                message: e.to_string(),
            }),
    }
}

/// Builder for [`SessionManagerConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionManagerConfigBuilder {
    config: SessionManagerConfig,
}

impl SessionManagerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default: Microsoft (`mm`).
    pub fn service(mut self, service: Service) -> Self {
        self.config.service = service;
        self
    }

    /// Default: 73 (Brazil on Hero SMS).
    pub fn country(mut self, country: CountryId) -> Self {
        self.config.country = country;
        self
    }

    /// Default: 55.
    pub fn dial_code(mut self, dial_code: Option<DialCode>) -> Self {
        self.config.dial_code = dial_code;
        self
    }

    /// Default: 50 seconds.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Default: 30 seconds.
    pub fn price_ttl(mut self, ttl: Duration) -> Self {
        self.config.price_ttl = ttl;
        self
    }

    /// Default: 10 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Default: minimum balance of 0.01.
    pub fn balance_policy(mut self, policy: BalancePolicy) -> Self {
        self.config.balance_policy = policy;
        self
    }

    pub fn price_resolution(mut self, resolution: PriceResolution) -> Self {
        self.config.price_resolution = resolution;
        self
    }

    /// Default: true.
    pub fn request_additional_codes(mut self, enabled: bool) -> Self {
        self.config.request_additional_codes = enabled;
        self
    }

    pub fn build(self) -> SessionManagerConfig {
        self.config
    }
}

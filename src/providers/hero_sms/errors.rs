//! Error types for the Hero SMS provider.

use crate::errors::{ErrorCategory, GatewayError, RetryableError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Error tokens returned by the Hero SMS handler API.
#[derive(Debug, Clone, PartialEq)]
pub enum HeroSmsErrorCode {
    // === Transient / Server Errors ===
    /// Internal SQL error on service side.
    ErrorSql,
    /// Account blocked by channel limits (temporary).
    ChannelsLimit,

    // === Acquisition outcomes ===
    /// No numbers available for the requested country/service.
    NoNumbers,
    /// Not enough money on the account.
    NoBalance,

    // === Fatal / Client Errors ===
    /// Invalid API key.
    BadKey,
    /// Incorrect action.
    BadAction,
    /// Incorrect service code.
    BadService,
    /// Incorrect status.
    BadStatus,
    /// Activation with this id does not exist.
    NoActivation,
    /// Invalid activation ID or ID is not a number.
    WrongActivationId,
    /// Not allowed to cancel within first 2 minutes.
    EarlyCancelDenied,
    /// Account banned until specified datetime.
    Banned { until: String },
    /// Maximum price is less than allowed minimum.
    WrongMaxPrice { min: Option<f64> },

    /// Unknown error token.
    Unknown { raw: String },
}

impl HeroSmsErrorCode {
    /// Returns the API token.
    pub fn code_name(&self) -> &str {
        match self {
            Self::ErrorSql => "ERROR_SQL",
            Self::ChannelsLimit => "CHANNELS_LIMIT",
            Self::NoNumbers => "NO_NUMBERS",
            Self::NoBalance => "NO_BALANCE",
            Self::BadKey => "BAD_KEY",
            Self::BadAction => "BAD_ACTION",
            Self::BadService => "BAD_SERVICE",
            Self::BadStatus => "BAD_STATUS",
            Self::NoActivation => "NO_ACTIVATION",
            Self::WrongActivationId => "WRONG_ACTIVATION_ID",
            Self::EarlyCancelDenied => "EARLY_CANCEL_DENIED",
            Self::Banned { .. } => "BANNED",
            Self::WrongMaxPrice { .. } => "WRONG_MAX_PRICE",
            Self::Unknown { raw } => raw.as_str(),
        }
    }

    /// Returns human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::ErrorSql => "Internal SQL error on service side".to_string(),
            Self::ChannelsLimit => "Account blocked by channel limits".to_string(),
            Self::NoNumbers => "No numbers available".to_string(),
            Self::NoBalance => "Insufficient account balance".to_string(),
            Self::BadKey => "Invalid API key".to_string(),
            Self::BadAction => "Incorrect action".to_string(),
            Self::BadService => "Incorrect service code".to_string(),
            Self::BadStatus => "Incorrect status".to_string(),
            Self::NoActivation => "Activation does not exist".to_string(),
            Self::WrongActivationId => "Invalid activation ID".to_string(),
            Self::EarlyCancelDenied => "Not allowed to cancel within first 2 minutes".to_string(),
            Self::Banned { until } => format!("Account banned until {}", until),
            Self::WrongMaxPrice { min } => match min {
                Some(v) => format!("Maximum price is less than allowed minimum: {}", v),
                None => "Maximum price is less than allowed minimum".to_string(),
            },
            Self::Unknown { raw } => format!("Unknown error: {}", raw),
        }
    }

    /// Parse an error token from a raw API response.
    ///
    /// Returns `None` for anything that is not an error token, including the
    /// `ACCESS_*` and `STATUS_*` success answers.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let s = raw.trim();

        let code = match s {
            "ERROR_SQL" => Self::ErrorSql,
            "CHANNELS_LIMIT" => Self::ChannelsLimit,
            "NO_NUMBERS" => Self::NoNumbers,
            "NO_BALANCE" => Self::NoBalance,
            "BAD_KEY" => Self::BadKey,
            "BAD_ACTION" => Self::BadAction,
            "BAD_SERVICE" => Self::BadService,
            "BAD_STATUS" => Self::BadStatus,
            "NO_ACTIVATION" => Self::NoActivation,
            "WRONG_ACTIVATION_ID" => Self::WrongActivationId,
            "EARLY_CANCEL_DENIED" => Self::EarlyCancelDenied,
            _ => return Self::parse_parametrized_error(s),
        };

        Some(code)
    }

    /// Parse tokens that carry a parameter (BANNED, WRONG_MAX_PRICE).
    fn parse_parametrized_error(s: &str) -> Option<Self> {
        // BANNED:'YYYY-m-d H-i-s'
        static RE_BANNED: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"^BANNED\s*:\s*['"]([^'"]+)['"]$"#).unwrap());
        if let Some(cap) = RE_BANNED.captures(s) {
            let until = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Some(Self::Banned { until });
        }

        // WRONG_MAX_PRICE:<num>
        static RE_WRONG_MAX_PRICE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"^WRONG_MAX_PRICE\s*:\s*([0-9]+(?:\.[0-9]+)?)$"#).unwrap());
        if let Some(cap) = RE_WRONG_MAX_PRICE.captures(s) {
            let min = cap.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            return Some(Self::WrongMaxPrice { min });
        }

        if Self::looks_like_error_code(s) {
            return Some(Self::Unknown { raw: s.to_string() });
        }

        None
    }

    fn looks_like_error_code(s: &str) -> bool {
        if s.starts_with("ACCESS_") || s.starts_with("STATUS_") {
            return false;
        }

        const ERROR_PREFIXES: [&str; 7] = [
            "NO_", "ERROR_", "BAD_", "WRONG_", "EARLY_", "BANNED", "CHANNELS_",
        ];

        ERROR_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
    }

    /// Returns true if repeating the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ErrorSql | Self::ChannelsLimit)
    }

    /// Returns true if a fresh acquisition might succeed.
    pub fn should_retry_operation(&self) -> bool {
        match self {
            Self::ErrorSql | Self::ChannelsLimit => true,
            // Stock changes; a later attempt can find numbers.
            Self::NoNumbers => true,
            Self::NoActivation | Self::WrongActivationId => true,
            Self::NoBalance
            | Self::BadKey
            | Self::BadAction
            | Self::BadService
            | Self::BadStatus
            | Self::EarlyCancelDenied
            | Self::Banned { .. }
            | Self::WrongMaxPrice { .. }
            | Self::Unknown { .. } => false,
        }
    }

    /// Outcome class of the token.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ErrorSql | Self::ChannelsLimit => ErrorCategory::Network,
            Self::NoNumbers => ErrorCategory::NoNumbers,
            Self::NoBalance => ErrorCategory::NoBalance,
            Self::BadKey => ErrorCategory::BadKey,
            _ => ErrorCategory::Other,
        }
    }
}

impl Display for HeroSmsErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_name())
    }
}

/// Error token returned by the Hero SMS service.
#[derive(Debug, Clone, Error)]
#[error("Hero SMS service error: code={code}, description={description}")]
pub struct HeroSmsServiceError {
    /// Parsed error token.
    pub code: HeroSmsErrorCode,
    /// Human-readable description.
    pub description: String,
    /// Raw response text.
    pub raw: String,
}

impl HeroSmsServiceError {
    pub fn new(code: HeroSmsErrorCode, raw: String) -> Self {
        let description = code.description();
        Self {
            code,
            description,
            raw,
        }
    }
}

/// Parse a Hero SMS error from API response text.
pub(crate) fn parse_hero_sms_error(raw: &str) -> Option<HeroSmsServiceError> {
    let code = HeroSmsErrorCode::from_raw(raw)?;
    let error = HeroSmsServiceError::new(code, raw.trim().to_string());

    #[cfg(feature = "tracing")]
    warn!(
        code = %error.code,
        description = %error.description,
        "Hero SMS returned error"
    );

    Some(error)
}

/// Main error type for Hero SMS client operations.
#[derive(Debug, Error)]
pub enum HeroSmsError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Error building the request URL.
    #[error("Error building Hero SMS request URL: {0}")]
    BuildRequestUrl(#[source] serde_urlencoded::ser::Error),

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// Error token returned by the service.
    #[error("Hero SMS service error: {0}")]
    Service(#[source] HeroSmsServiceError),

    /// The service answered with something the action does not define.
    #[error("Unexpected {action} response: {raw}")]
    UnexpectedResponse { action: &'static str, raw: String },

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HeroSmsError>;

impl RetryableError for HeroSmsError {
    fn is_retryable(&self) -> bool {
        match self {
            HeroSmsError::Service(error) => error.code.is_retryable(),
            HeroSmsError::HttpRequest(_) => true,
            HeroSmsError::BuildHttpClient(_)
            | HeroSmsError::BuildRequestUrl(_)
            | HeroSmsError::ParseResponse(_)
            | HeroSmsError::UnexpectedResponse { .. }
            | HeroSmsError::DeserializeJson(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            HeroSmsError::Service(error) => error.code.should_retry_operation(),
            HeroSmsError::HttpRequest(_) | HeroSmsError::ParseResponse(_) => true,
            HeroSmsError::BuildHttpClient(_)
            | HeroSmsError::BuildRequestUrl(_)
            | HeroSmsError::UnexpectedResponse { .. }
            | HeroSmsError::DeserializeJson(_) => false,
        }
    }
}

impl GatewayError for HeroSmsError {
    fn category(&self) -> ErrorCategory {
        match self {
            HeroSmsError::Service(error) => error.code.category(),
            HeroSmsError::HttpRequest(_) | HeroSmsError::ParseResponse(_) => ErrorCategory::Network,
            HeroSmsError::BuildHttpClient(_)
            | HeroSmsError::BuildRequestUrl(_)
            | HeroSmsError::UnexpectedResponse { .. }
            | HeroSmsError::DeserializeJson(_) => ErrorCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_errors() {
        let test_cases = vec![
            ("NO_NUMBERS", HeroSmsErrorCode::NoNumbers),
            ("NO_BALANCE", HeroSmsErrorCode::NoBalance),
            ("BAD_KEY", HeroSmsErrorCode::BadKey),
            ("ERROR_SQL", HeroSmsErrorCode::ErrorSql),
            ("NO_ACTIVATION", HeroSmsErrorCode::NoActivation),
        ];

        for (input, expected) in test_cases {
            let error = parse_hero_sms_error(input).unwrap();
            assert_eq!(error.code, expected);
            assert_eq!(error.raw, input);
        }
    }

    #[test]
    fn test_parse_banned_error() {
        let error = parse_hero_sms_error("BANNED:'2025-12-31 23:59:59'").unwrap();
        assert_eq!(
            error.code,
            HeroSmsErrorCode::Banned {
                until: "2025-12-31 23:59:59".to_string()
            }
        );
    }

    #[test]
    fn test_parse_wrong_max_price() {
        let error = parse_hero_sms_error("WRONG_MAX_PRICE:10.5").unwrap();
        assert_eq!(error.code, HeroSmsErrorCode::WrongMaxPrice { min: Some(10.5) });
    }

    #[test]
    fn test_unknown_error_prefix() {
        let error = parse_hero_sms_error("NO_SUCH_THING").unwrap();
        assert_eq!(
            error.code,
            HeroSmsErrorCode::Unknown {
                raw: "NO_SUCH_THING".to_string()
            }
        );
    }

    #[test]
    fn test_success_answers_are_not_errors() {
        for answer in [
            "ACCESS_READY",
            "ACCESS_RETRY_GET",
            "ACCESS_BALANCE:10.5",
            "STATUS_OK:1234",
            "STATUS_WAIT_CODE",
            "STATUS_CANCEL",
        ] {
            assert!(
                parse_hero_sms_error(answer).is_none(),
                "'{}' should not be treated as an error",
                answer
            );
        }
    }

    #[test]
    fn test_acquisition_outcomes_are_distinct_categories() {
        assert_eq!(HeroSmsErrorCode::NoNumbers.category(), ErrorCategory::NoNumbers);
        assert_eq!(HeroSmsErrorCode::NoBalance.category(), ErrorCategory::NoBalance);
        assert_eq!(HeroSmsErrorCode::BadKey.category(), ErrorCategory::BadKey);
        assert_eq!(HeroSmsErrorCode::ErrorSql.category(), ErrorCategory::Network);
        assert_eq!(HeroSmsErrorCode::NoActivation.category(), ErrorCategory::Other);
    }

    #[test]
    fn test_no_numbers_is_not_retried_in_place() {
        assert!(!HeroSmsErrorCode::NoNumbers.is_retryable());
        assert!(HeroSmsErrorCode::NoNumbers.should_retry_operation());
        assert!(!HeroSmsErrorCode::NoBalance.should_retry_operation());
        assert!(HeroSmsErrorCode::ChannelsLimit.is_retryable());
    }

    #[test]
    fn test_service_error_classification() {
        let err = HeroSmsError::Service(parse_hero_sms_error("BAD_KEY").unwrap());
        assert_eq!(err.category(), ErrorCategory::BadKey);
        assert!(!err.is_retryable());

        let err = HeroSmsError::UnexpectedResponse {
            action: "getStatus",
            raw: "???".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Other);
    }
}

//! Wire types of the Hero SMS handler API.

use crate::providers::traits::{CodeStatus, StatusUpdate};
use crate::types::{Price, SessionId, SmsCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

/// Response from the getNumberV2 action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPhoneNumberResponse {
    /// Activation ID for this phone number.
    #[serde(rename = "activationId", deserialize_with = "string_or_number")]
    pub session_id: SessionId,
    /// Full phone number with country code.
    #[serde(deserialize_with = "string_or_number")]
    pub phone_number: String,
    /// Cost of this activation in the account currency.
    #[serde(default)]
    pub activation_cost: Option<Decimal>,
    /// Country calling code.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Whether another SMS can be requested for this activation.
    #[serde(default)]
    pub can_get_another_sms: bool,
    /// When the activation started.
    #[serde(default)]
    pub activation_time: Option<String>,
    /// When the activation expires.
    #[serde(default)]
    pub activation_end_time: Option<String>,
    /// Mobile operator name.
    #[serde(default)]
    pub activation_operator: Option<String>,
}

/// Ids and numbers arrive either quoted or bare depending on the API revision.
fn string_or_number<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => T::from(s),
        Raw::Number(n) => T::from(n.to_string()),
    })
}

/// Answer of the getStatus action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    /// `STATUS_OK:<code>`
    Ok(SmsCode),
    /// `STATUS_WAIT_CODE`
    WaitCode,
    /// `STATUS_WAIT_RETRY[:<last code>]`, waiting for the next code.
    WaitRetry { last_code: Option<SmsCode> },
    /// `STATUS_WAIT_RESEND`
    WaitResend,
    /// `STATUS_CANCEL`
    Cancel,
}

impl ActivationState {
    /// Parse a getStatus answer.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let s = raw.trim();
        match s {
            "STATUS_WAIT_CODE" => return Some(Self::WaitCode),
            "STATUS_WAIT_RESEND" => return Some(Self::WaitResend),
            "STATUS_CANCEL" => return Some(Self::Cancel),
            "STATUS_WAIT_RETRY" => return Some(Self::WaitRetry { last_code: None }),
            _ => {}
        }

        if let Some(code) = s.strip_prefix("STATUS_OK:") {
            let code = code.trim().trim_matches('\'');
            return (!code.is_empty()).then(|| Self::Ok(SmsCode::new(code)));
        }

        if let Some(last) = s.strip_prefix("STATUS_WAIT_RETRY:") {
            let last = last.trim().trim_matches('\'');
            let last_code = (!last.is_empty()).then(|| SmsCode::new(last));
            return Some(Self::WaitRetry { last_code });
        }

        None
    }
}

impl From<ActivationState> for CodeStatus {
    fn from(state: ActivationState) -> Self {
        match state {
            ActivationState::Ok(code) => CodeStatus::Delivered(code),
            ActivationState::WaitCode
            | ActivationState::WaitRetry { .. }
            | ActivationState::WaitResend => CodeStatus::Waiting,
            ActivationState::Cancel => CodeStatus::Cancelled,
        }
    }
}

/// Activation status codes for the setStatus action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    /// Number is ready, SMS was sent.
    Ready,
    /// Request one more code on the same number.
    RequestAnotherCode,
    /// Finish the activation.
    FinishActivation,
    /// Cancel the activation.
    Cancel,
}

impl ActivationStatus {
    /// Numeric status code for the API.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ready => 1,
            Self::RequestAnotherCode => 3,
            Self::FinishActivation => 6,
            Self::Cancel => 8,
        }
    }
}

impl From<StatusUpdate> for ActivationStatus {
    fn from(update: StatusUpdate) -> Self {
        match update {
            StatusUpdate::Ready => Self::Ready,
            StatusUpdate::RequestAnotherCode => Self::RequestAnotherCode,
            StatusUpdate::Finish => Self::FinishActivation,
            StatusUpdate::Cancel => Self::Cancel,
        }
    }
}

impl Display for ActivationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready(1)"),
            Self::RequestAnotherCode => write!(f, "RequestAnotherCode(3)"),
            Self::FinishActivation => write!(f, "FinishActivation(6)"),
            Self::Cancel => write!(f, "Cancel(8)"),
        }
    }
}

/// Answer of the setStatus action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetStatusResponse {
    /// Numbers readiness confirmed.
    Ready,
    /// Waiting for new SMS.
    RetryGet,
    /// Service successfully activated.
    Activation,
    /// Activation canceled.
    Cancel,
}

impl SetStatusResponse {
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ACCESS_READY" => Some(Self::Ready),
            "ACCESS_RETRY_GET" => Some(Self::RetryGet),
            "ACCESS_ACTIVATION" => Some(Self::Activation),
            "ACCESS_CANCEL" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl Display for SetStatusResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ACCESS_READY"),
            Self::RetryGet => write!(f, "ACCESS_RETRY_GET"),
            Self::Activation => write!(f, "ACCESS_ACTIVATION"),
            Self::Cancel => write!(f, "ACCESS_CANCEL"),
        }
    }
}

/// Parse a getBalance answer (`ACCESS_BALANCE:<amount>`).
pub fn parse_balance(raw: &str) -> Option<Price> {
    raw.trim()
        .strip_prefix("ACCESS_BALANCE:")
        .and_then(|amount| amount.parse::<Price>().ok())
}

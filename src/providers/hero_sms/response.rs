//! Response parsing for the Hero SMS handler API.

use super::errors::{HeroSmsServiceError, parse_hero_sms_error};
use serde::de::DeserializeOwned;

/// Response of an action that answers JSON on success and a plain-text
/// token on failure (getNumberV2, getPrices).
#[derive(Debug)]
pub enum HeroSmsResponse<T> {
    Success(T),
    Error(HeroSmsServiceError),
}

impl<T> HeroSmsResponse<T> {
    pub fn into_result(self) -> Result<T, HeroSmsServiceError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Error(e) => Err(e),
        }
    }
}

impl<T: DeserializeOwned> HeroSmsResponse<T> {
    /// Parse a response body, treating known error tokens as errors.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        if let Some(error) = parse_hero_sms_error(text) {
            return Ok(Self::Error(error));
        }

        let data = serde_json::from_str::<T>(text)?;
        Ok(Self::Success(data))
    }
}

/// Response of an action that answers plain text either way
/// (getBalance, getStatus, setStatus).
#[derive(Debug)]
pub enum HeroSmsTextResponse {
    Success(String),
    Error(HeroSmsServiceError),
}

impl HeroSmsTextResponse {
    pub fn from_text(text: &str) -> Self {
        match parse_hero_sms_error(text) {
            Some(error) => Self::Error(error),
            None => Self::Success(text.trim().to_string()),
        }
    }

    pub fn into_result(self) -> Result<String, HeroSmsServiceError> {
        match self {
            Self::Success(text) => Ok(text),
            Self::Error(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::hero_sms::errors::HeroSmsErrorCode;
    use crate::providers::hero_sms::types::GetPhoneNumberResponse;

    #[test]
    fn test_json_response_success() {
        let json = r#"{
            "activationId": "123456",
            "phoneNumber": "5511955551234",
            "activationCost": 0.25,
            "canGetAnotherSms": true
        }"#;

        let data = HeroSmsResponse::<GetPhoneNumberResponse>::from_text(json)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(data.phone_number, "5511955551234");
        assert!(data.can_get_another_sms);
    }

    #[test]
    fn test_json_response_error_token() {
        let response = HeroSmsResponse::<GetPhoneNumberResponse>::from_text("NO_BALANCE").unwrap();
        match response.into_result() {
            Err(error) => assert_eq!(error.code, HeroSmsErrorCode::NoBalance),
            Ok(_) => panic!("Expected error"),
        }
    }

    #[test]
    fn test_json_response_garbage() {
        assert!(HeroSmsResponse::<GetPhoneNumberResponse>::from_text("<html>").is_err());
    }

    #[test]
    fn test_text_response() {
        match HeroSmsTextResponse::from_text("STATUS_OK:1234\n") {
            HeroSmsTextResponse::Success(s) => assert_eq!(s, "STATUS_OK:1234"),
            HeroSmsTextResponse::Error(_) => panic!("Expected success"),
        }

        match HeroSmsTextResponse::from_text("BAD_KEY") {
            HeroSmsTextResponse::Success(_) => panic!("Expected error"),
            HeroSmsTextResponse::Error(e) => assert_eq!(e.code, HeroSmsErrorCode::BadKey),
        }
    }
}

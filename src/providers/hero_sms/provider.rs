//! Hero SMS provider implementation.

use super::client::HeroSms;
use super::errors::{HeroSmsError, Result};
use super::types::ActivationStatus;
use crate::providers::traits::{Acquisition, CodeStatus, Provider, StatusUpdate};
use crate::types::{CountryId, FullNumber, Price, Service, SessionId};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Hero SMS provider implementation.
///
/// Wraps a [`HeroSms`] client and implements the generic [`Provider`] trait.
/// Service and country are passed per call, so one provider serves any pair.
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
/// use sms_sessions::{SessionManager, SmsRetryableProvider};
///
/// let client = HeroSms::with_api_key("your_api_key")?;
/// let provider = SmsRetryableProvider::new(HeroSmsProvider::new(client));
///
/// let manager = SessionManager::builder(provider).build();
/// let handle = manager.acquire_default().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HeroSmsProvider {
    client: HeroSms,
}

impl HeroSmsProvider {
    /// Create a new Hero SMS provider.
    pub fn new(client: HeroSms) -> Self {
        Self { client }
    }

    /// Get reference to the inner client.
    pub fn client(&self) -> &HeroSms {
        &self.client
    }
}

impl Provider for HeroSmsProvider {
    type Error = HeroSmsError;

    async fn get_balance(&self) -> Result<Price> {
        self.client.get_balance().await
    }

    async fn get_price(&self, service: &Service, country: CountryId) -> Result<Option<Price>> {
        self.client.get_price(service, country).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HeroSmsProvider::acquire_number",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    async fn acquire_number(&self, service: &Service, country: CountryId) -> Result<Acquisition> {
        let response = self.client.get_phone_number(service, country).await?;

        Ok(Acquisition {
            session_id: response.session_id,
            full_number: FullNumber::from(response.phone_number),
            allows_multiple_codes: response.can_get_another_sms,
            cost: response.activation_cost.and_then(|c| Price::from_decimal(c).ok()),
        })
    }

    async fn get_code(&self, session_id: &SessionId) -> Result<CodeStatus> {
        let state = self.client.get_status(session_id).await?;
        Ok(CodeStatus::from(state))
    }

    async fn set_status(&self, session_id: &SessionId, update: StatusUpdate) -> Result<()> {
        let _response = self
            .client
            .set_activation_status(session_id, ActivationStatus::from(update))
            .await?;

        #[cfg(feature = "tracing")]
        debug!(
            session_id = %session_id,
            update = %update,
            response = %_response,
            "Activation status updated"
        );

        Ok(())
    }
}

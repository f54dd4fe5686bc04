//! Hero SMS HTTP client.

use super::errors::{HeroSmsError, Result};
use super::prices::extract_price;
use super::response::{HeroSmsResponse, HeroSmsTextResponse};
use super::types::{
    ActivationState, ActivationStatus, GetPhoneNumberResponse, SetStatusResponse, parse_balance,
};
use crate::types::{CountryId, Price, Service, SessionId};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default Hero SMS API URL.
pub const DEFAULT_API_URL: &str = "https://hero-sms.com/stubs/handler_api.php";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hero SMS HTTP client.
///
/// One method per handler action. The client is service-agnostic: the
/// service and country are passed per call.
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::hero_sms::HeroSms;
/// use sms_sessions::{CountryId, Service};
///
/// let client = HeroSms::with_api_key("your_api_key")?;
///
/// let balance = client.get_balance().await?;
/// let number = client.get_phone_number(&Service::Microsoft, CountryId::new(73)).await?;
/// println!("Got {} (balance {})", number.phone_number, balance);
/// ```
#[derive(Clone)]
pub struct HeroSms {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for HeroSms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeroSms")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`HeroSms`] client.
pub struct HeroSmsClientBuilder {
    api_key: String,
    endpoint: Option<Url>,
    timeout: Duration,
    http_client: Option<ClientWithMiddleware>,
}

impl HeroSmsClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            http_client: None,
        }
    }

    /// Set a custom API endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Per-request timeout of the default HTTP client.
    ///
    /// Ignored when a custom client is supplied through [`http_client`](Self::http_client).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<HeroSms> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| Url::parse(DEFAULT_API_URL).expect("Invalid default URL"));

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(HeroSmsError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(HeroSms {
            http_client,
            api_key: SecretString::from(self.api_key),
            endpoint,
        })
    }
}

impl HeroSms {
    /// Create a client for a custom endpoint.
    pub fn new(endpoint: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(endpoint.as_ref()).map_err(|e| {
            HeroSmsError::BuildRequestUrl(serde_urlencoded::ser::Error::Custom(
                std::borrow::Cow::Owned(e.to_string()),
            ))
        })?;

        Self::builder(api_key).endpoint(url).build()
    }

    /// Create a client with the default API URL.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> HeroSmsClientBuilder {
        HeroSmsClientBuilder::new(api_key)
    }

    fn build_request_url(&self, action: &str, additional: Vec<(&str, String)>) -> Result<Url> {
        let mut endpoint = self.endpoint.clone();
        let api_key = self.api_key.expose_secret().to_string();

        let mut params = HashMap::new();
        params.insert("api_key", api_key);
        params.insert("action", action.to_string());

        for (key, value) in additional {
            params.insert(key, value);
        }

        endpoint.set_query(Some(
            &serde_urlencoded::to_string(&params).map_err(HeroSmsError::BuildRequestUrl)?,
        ));

        Ok(endpoint)
    }

    async fn send_request(&self, url: Url) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(HeroSmsError::HttpRequest)?;

        response.text().await.map_err(HeroSmsError::ParseResponse)
    }

    /// Account balance (getBalance).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "HeroSms::get_balance", skip_all)
    )]
    pub async fn get_balance(&self) -> Result<Price> {
        let url = self.build_request_url("getBalance", Vec::new())?;
        let text = self.send_request(url).await?;

        let raw = HeroSmsTextResponse::from_text(&text)
            .into_result()
            .map_err(HeroSmsError::Service)?;

        let balance = parse_balance(&raw).ok_or(HeroSmsError::UnexpectedResponse {
            action: "getBalance",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        Span::current().set_status(Status::Ok);

        Ok(balance)
    }

    /// Raw price table (getPrices) for a service and country.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HeroSms::get_prices",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    pub async fn get_prices(&self, service: &Service, country: CountryId) -> Result<Value> {
        let url = self.build_request_url(
            "getPrices",
            vec![
                ("service", service.code().to_string()),
                ("country", country.to_string()),
            ],
        )?;

        let text = self.send_request(url).await?;

        HeroSmsResponse::<Value>::from_text(&text)
            .map_err(HeroSmsError::DeserializeJson)?
            .into_result()
            .map_err(HeroSmsError::Service)
    }

    /// Rental price for a service and country, if listed.
    pub async fn get_price(&self, service: &Service, country: CountryId) -> Result<Option<Price>> {
        let table = self.get_prices(service, country).await?;
        Ok(extract_price(&table, country, service.code()))
    }

    /// Rent a phone number (getNumberV2).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HeroSms::get_phone_number",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    pub async fn get_phone_number(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<GetPhoneNumberResponse> {
        let url = self.build_request_url(
            "getNumberV2",
            vec![
                ("service", service.code().to_string()),
                ("country", country.to_string()),
            ],
        )?;

        let text = self.send_request(url).await?;

        let data = HeroSmsResponse::<GetPhoneNumberResponse>::from_text(&text)
            .map_err(HeroSmsError::DeserializeJson)?
            .into_result()
            .map_err(HeroSmsError::Service)?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("session_id", data.session_id.as_str())
                .record("phone_number", &data.phone_number)
                .set_status(Status::Ok);
        }

        Ok(data)
    }

    /// Activation status (getStatus).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HeroSms::get_status",
            skip_all,
            fields(session_id = %session_id)
        )
    )]
    pub async fn get_status(&self, session_id: &SessionId) -> Result<ActivationState> {
        let url = self.build_request_url("getStatus", vec![("id", session_id.to_string())])?;

        let text = self.send_request(url).await?;

        let raw = HeroSmsTextResponse::from_text(&text)
            .into_result()
            .map_err(HeroSmsError::Service)?;

        let state = ActivationState::from_raw(&raw).ok_or(HeroSmsError::UnexpectedResponse {
            action: "getStatus",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        if let ActivationState::Ok(code) = &state {
            Span::current()
                .record("sms_code", code.as_str())
                .set_status(Status::Ok);
        }

        Ok(state)
    }

    /// Change activation status (setStatus).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HeroSms::set_activation_status",
            skip_all,
            fields(session_id = %session_id, status = %status)
        )
    )]
    pub async fn set_activation_status(
        &self,
        session_id: &SessionId,
        status: ActivationStatus,
    ) -> Result<SetStatusResponse> {
        let url = self.build_request_url(
            "setStatus",
            vec![
                ("id", session_id.to_string()),
                ("status", status.code().to_string()),
            ],
        )?;

        let text = self.send_request(url).await?;

        let raw = HeroSmsTextResponse::from_text(&text)
            .into_result()
            .map_err(HeroSmsError::Service)?;

        let result = SetStatusResponse::from_raw(&raw).ok_or(HeroSmsError::UnexpectedResponse {
            action: "setStatus",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("response", result.to_string())
                .set_status(Status::Ok);
        }

        Ok(result)
    }
}

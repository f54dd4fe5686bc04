//! Provider trait definition.

use crate::errors::GatewayError;
use crate::types::{CountryId, FullNumber, Price, Service, SessionId, SmsCode};
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::Future;

/// Result of a successful number acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    /// Provider-issued activation id; becomes the session id.
    pub session_id: SessionId,
    /// Full number including the country dial code.
    pub full_number: FullNumber,
    /// Whether the provider lets the same number receive further codes.
    pub allows_multiple_codes: bool,
    /// Cost reported with the acquisition, if the provider sends one.
    pub cost: Option<Price>,
}

/// Outcome of asking the provider for the code of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeStatus {
    /// A code has been delivered to the number.
    Delivered(SmsCode),
    /// Nothing delivered yet.
    Waiting,
    /// The activation was cancelled or expired on the provider side.
    Cancelled,
}

/// Status transitions a session can push to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusUpdate {
    /// Confirm the number is ready to receive the code.
    Ready,
    /// Ask for another code on the same number.
    RequestAnotherCode,
    /// Complete the activation.
    Finish,
    /// Cancel the activation and release the number.
    Cancel,
}

impl Display for StatusUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusUpdate::Ready => "ready",
            StatusUpdate::RequestAnotherCode => "request_another_code",
            StatusUpdate::Finish => "finish",
            StatusUpdate::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Remote operations the session core consumes from an SMS provider.
///
/// Each method is one remote call. Implementations classify their failures
/// through [`GatewayError`] so the caller can tell a transport fault from
/// "no numbers", "no balance" and "bad credentials".
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::{
///     Acquisition, CodeStatus, CountryId, Price, Provider, Service, SessionId, StatusUpdate,
/// };
///
/// #[derive(Clone)]
/// struct MyProvider { /* ... */ }
///
/// impl Provider for MyProvider {
///     type Error = MyError;
///
///     async fn get_balance(&self) -> Result<Price, Self::Error> { /* ... */ }
///     async fn get_price(
///         &self,
///         service: &Service,
///         country: CountryId,
///     ) -> Result<Option<Price>, Self::Error> { /* ... */ }
///     async fn acquire_number(
///         &self,
///         service: &Service,
///         country: CountryId,
///     ) -> Result<Acquisition, Self::Error> { /* ... */ }
///     async fn get_code(
///         &self,
///         session_id: &SessionId,
///     ) -> Result<CodeStatus, Self::Error> { /* ... */ }
///     async fn set_status(
///         &self,
///         session_id: &SessionId,
///         update: StatusUpdate,
///     ) -> Result<(), Self::Error> { /* ... */ }
/// }
/// ```
pub trait Provider: Send + Sync + Clone + 'static {
    /// Error type returned by provider operations.
    type Error: StdError + GatewayError + Send + Sync + 'static;

    /// Current account balance.
    fn get_balance(&self) -> impl Future<Output = Result<Price, Self::Error>> + Send;

    /// Price of renting a number for `service` in `country`.
    ///
    /// Returns `None` when the provider does not list a price for the pair.
    fn get_price(
        &self,
        service: &Service,
        country: CountryId,
    ) -> impl Future<Output = Result<Option<Price>, Self::Error>> + Send;

    /// Rent a number for `service` in `country`.
    fn acquire_number(
        &self,
        service: &Service,
        country: CountryId,
    ) -> impl Future<Output = Result<Acquisition, Self::Error>> + Send;

    /// Check whether a code has been delivered for the activation.
    fn get_code(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<CodeStatus, Self::Error>> + Send;

    /// Push a status transition for the activation.
    fn set_status(
        &self,
        session_id: &SessionId,
        update: StatusUpdate,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

//! Session manager trait definition.

use super::manager::{Ack, PollReport, SessionHandle, SessionStats};
use crate::errors::RetryableError;
use crate::types::{CountryId, Price, Service, SessionId};
use std::error::Error as StdError;

/// Inbound operations of a session manager.
///
/// This is the surface an outer layer (HTTP routes, a CLI) drives.
#[allow(async_fn_in_trait)]
pub trait SessionManagerTrait: Send + Sync {
    /// The error type for this manager.
    type Error: StdError + RetryableError;

    /// Rent a number for `service` in `country`.
    ///
    /// The balance precondition is checked first; when it fails the
    /// provider is never asked for a number.
    async fn acquire(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<SessionHandle, Self::Error>;

    /// Ask the provider for the session's code and apply the result.
    ///
    /// An unknown or closed id yields a report with
    /// [`PollStatus::NotFound`](super::manager::PollStatus::NotFound).
    async fn poll(&self, session_id: &SessionId) -> Result<PollReport, Self::Error>;

    /// Cancel the session and release the number. Idempotent.
    async fn cancel(&self, session_id: &SessionId) -> Ack;

    /// Complete the session. Idempotent.
    async fn finish(&self, session_id: &SessionId) -> Ack;

    /// Aggregate counters.
    fn stats(&self) -> SessionStats;

    /// Rental price, served from cache while fresh. Zero when unknown.
    async fn get_price(&self, service: &Service, country: CountryId) -> Price;
}

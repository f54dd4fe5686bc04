//! Session manager: acquisition, polling, expiry and teardown.

use super::config::{BalancePolicy, PriceResolution, SessionManagerConfig};
use super::error::SessionError;
use super::model::{Session, SessionState};
use super::price_cache::PriceCache;
use super::scheduler::TimeoutScheduler;
use super::store::{SessionSlot, SessionStore};
use super::traits::SessionManagerTrait;
use crate::providers::traits::{CodeStatus, Provider, StatusUpdate};
use crate::types::{CountryId, FullNumber, Price, Service, SessionId, SmsCode};
use crate::utils::dial_code::display_number;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Returned by a successful acquisition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionHandle {
    pub session_id: SessionId,
    /// Number for display, dial code stripped when known.
    pub phone_number: String,
    pub full_number: FullNumber,
    pub service: Service,
    pub country: CountryId,
    /// Zero while `price_pending` is set.
    pub price: Price,
    pub price_pending: bool,
    pub allows_multiple_codes: bool,
}

/// What a poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// A new code arrived with this poll.
    CodeReceived,
    /// No code has been delivered yet.
    WaitingForCode,
    /// Codes were delivered before; the provider has nothing newer.
    WaitingForNewCode,
    /// The provider cancelled the activation. The session is gone.
    Cancelled,
    /// No active session with this id.
    NotFound,
}

/// Result of [`SessionManagerTrait::poll`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub session_id: SessionId,
    pub status: PollStatus,
    /// Set only when `status` is [`PollStatus::CodeReceived`].
    pub code: Option<SmsCode>,
    /// Number of distinct codes delivered so far.
    pub received_count: usize,
    /// Whether another code may still arrive on this number.
    pub more_codes_possible: bool,
    /// State after the poll; `None` once the session is gone.
    pub state: Option<SessionState>,
}

impl PollReport {
    fn not_found(session_id: &SessionId) -> Self {
        Self {
            session_id: session_id.clone(),
            status: PollStatus::NotFound,
            code: None,
            received_count: 0,
            more_codes_possible: false,
            state: None,
        }
    }

    fn from_session(session: &Session, status: PollStatus, code: Option<SmsCode>) -> Self {
        let state = session.state;
        Self {
            session_id: session.id.clone(),
            status,
            code,
            received_count: session.received_codes.len(),
            more_codes_possible: session.more_codes_possible(),
            state: state.is_active().then_some(state),
        }
    }
}

/// Acknowledgement of cancel and finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub session_id: SessionId,
    /// False when the session was already gone; nothing was done.
    pub was_active: bool,
}

/// Aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Sessions that ever received a code or were finished.
    pub succeeded_count: usize,
    pub active_count: usize,
    /// Distinct codes delivered over the manager's lifetime.
    pub total_codes_delivered: u64,
}

struct ManagerInner<P: Provider> {
    provider: P,
    config: SessionManagerConfig,
    store: SessionStore,
    scheduler: TimeoutScheduler,
    prices: PriceCache,
    codes_delivered: AtomicU64,
}

/// Owns every rented number's lifecycle.
///
/// Cheap to clone; clones share state. Expiry timers hold only a weak
/// reference, so dropping the last clone cancels them.
///
/// Per-session operations serialize on that session's lock, which a poll
/// holds across its provider call. A timer firing mid-poll therefore sees
/// the poll's outcome and never expires a session whose code just arrived.
///
/// # Example
///
/// ```rust,ignore
/// use sms_sessions::{SessionManager, SessionManagerTrait, PollStatus};
///
/// let manager = SessionManager::builder(provider).build();
///
/// let handle = manager.acquire_default().await?;
/// println!("Send the code to {}", handle.phone_number);
///
/// loop {
///     let report = manager.poll(&handle.session_id).await?;
///     match report.status {
///         PollStatus::CodeReceived => println!("Code: {}", report.code.unwrap()),
///         PollStatus::NotFound | PollStatus::Cancelled => break,
///         _ => {}
///     }
///     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
/// }
/// ```
pub struct SessionManager<P: Provider> {
    inner: Arc<ManagerInner<P>>,
}

impl<P: Provider> Clone for SessionManager<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Provider + std::fmt::Debug> std::fmt::Debug for SessionManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("provider", &self.inner.provider)
            .field("config", &self.inner.config)
            .field("active", &self.inner.store.len())
            .field("timers", &self.inner.scheduler.armed_count())
            .finish()
    }
}

impl<P: Provider> SessionManager<P> {
    pub fn new(provider: P, config: SessionManagerConfig) -> Self {
        let prices = PriceCache::new(config.price_ttl);
        Self {
            inner: Arc::new(ManagerInner {
                provider,
                config,
                store: SessionStore::new(),
                scheduler: TimeoutScheduler::new(),
                prices,
                codes_delivered: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_provider(provider: P) -> Self {
        Self::new(provider, SessionManagerConfig::default())
    }

    pub fn builder(provider: P) -> SessionManagerBuilder<P> {
        SessionManagerBuilder::new(provider)
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn config(&self) -> &SessionManagerConfig {
        &self.inner.config
    }

    /// Acquire a number for the configured service and country.
    pub async fn acquire_default(&self) -> Result<SessionHandle, SessionError> {
        let config = &self.inner.config;
        self.acquire(&config.service, config.country).await
    }

    /// Current account balance.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sessions.balance", skip_all)
    )]
    pub async fn balance(&self) -> Result<Price, SessionError> {
        let inner = &self.inner;
        inner
            .call(
                "get_balance",
                &inner.config.service,
                inner.config.country,
                inner.provider.get_balance(),
            )
            .await
    }

    /// Snapshot of an active session.
    pub async fn session(&self, session_id: &SessionId) -> Option<Session> {
        let slot = self.inner.store.get(session_id)?;
        let session = slot.lock().await;
        session.state.is_active().then(|| session.clone())
    }

    /// Snapshots of every active session, oldest first.
    pub async fn active_sessions(&self) -> Vec<Session> {
        let mut sessions = Vec::new();
        for slot in self.inner.store.slots() {
            let session = slot.lock().await;
            if session.state.is_active() {
                sessions.push(session.clone());
            }
        }
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Whether the session ever received a code or was finished.
    pub fn has_succeeded(&self, session_id: &SessionId) -> bool {
        self.inner.store.has_succeeded(session_id)
    }

    /// Drop the cached price so the next lookup asks the provider.
    pub fn invalidate_price(&self, service: &Service, country: CountryId) {
        self.inner.prices.invalidate(service, country);
    }

    /// Whether an expiry timer is pending for the session.
    pub fn is_expiry_armed(&self, session_id: &SessionId) -> bool {
        self.inner.scheduler.is_armed(session_id)
    }

    /// Disarm every expiry timer and stop renting numbers. Existing
    /// sessions stay in place; later acquisitions fail with
    /// [`SessionError::ShutDown`].
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        info!(
            active = self.inner.store.len(),
            timers = self.inner.scheduler.armed_count(),
            "Session manager shutting down"
        );

        self.inner.scheduler.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.scheduler.is_shut_down()
    }

    /// Returns false when the scheduler no longer accepts timers.
    fn arm_expiry(&self, session_id: &SessionId) -> bool {
        let weak: Weak<ManagerInner<P>> = Arc::downgrade(&self.inner);
        let id = session_id.clone();
        let timeout = self.inner.config.session_timeout;
        self.inner
            .scheduler
            .arm(session_id.clone(), timeout, move || async move {
                if let Some(inner) = weak.upgrade() {
                    inner.expire(&id).await;
                }
            })
    }

    fn resolve_price_later(&self, slot: SessionSlot, service: Service, country: CountryId) {
        let weak: Weak<ManagerInner<P>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let price = inner.price_for(&service, country).await;

            let mut session = slot.lock().await;
            session.price = price;
            session.price_pending = false;

            #[cfg(feature = "tracing")]
            debug!(session_id = %session.id, price = %price, "Deferred price resolved");
        });
    }

    async fn check_balance(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<Option<Price>, SessionError> {
        let inner = &self.inner;
        let balance = inner
            .call("get_balance", service, country, inner.provider.get_balance())
            .await?;

        let (required, price) = match inner.config.balance_policy {
            BalancePolicy::Minimum { threshold } => (threshold, None),
            BalancePolicy::PriceWithMargin { margin } => {
                let price = inner.price_for(service, country).await;
                if price.is_zero() {
                    #[cfg(feature = "tracing")]
                    warn!(balance = %balance, "Price unknown, balance policy cannot be checked");

                    return Err(SessionError::RemoteUnavailable {
                        operation: "get_price",
                        message: "price unknown, cannot check balance against price plus margin"
                            .to_string(),
                    });
                }
                (price + margin, Some(price))
            }
        };

        #[cfg(feature = "tracing")]
        debug!(balance = %balance, required = %required, "Balance checked");

        if balance < required {
            #[cfg(feature = "tracing")]
            warn!(balance = %balance, required = %required, "Insufficient balance");

            return Err(SessionError::InsufficientBalance { balance, required });
        }

        Ok(price)
    }
}

impl<P: Provider> ManagerInner<P> {
    /// Run one provider call under the request timeout.
    async fn call<T, Fut>(
        &self,
        operation: &'static str,
        service: &Service,
        country: CountryId,
        call: Fut,
    ) -> Result<T, SessionError>
    where
        Fut: Future<Output = Result<T, P::Error>>,
    {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let error = SessionError::from_gateway(e, operation, service, country);

                #[cfg(feature = "tracing")]
                warn!(operation, error = %error, "Provider call failed");

                Err(error)
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                warn!(
                    operation,
                    timeout_secs = %self.config.request_timeout.as_secs_f64(),
                    "Provider call timed out"
                );

                Err(SessionError::timed_out(operation))
            }
        }
    }

    async fn price_for(&self, service: &Service, country: CountryId) -> Price {
        self.prices
            .get_or_fetch(service, country, || {
                self.call(
                    "get_price",
                    service,
                    country,
                    self.provider.get_price(service, country),
                )
            })
            .await
    }

    /// Best-effort status push. Failures are logged only.
    async fn notify(&self, session_id: &SessionId, update: StatusUpdate) {
        match tokio::time::timeout(
            self.config.request_timeout,
            self.provider.set_status(session_id, update),
        )
        .await
        {
            Ok(Ok(())) => {
                #[cfg(feature = "tracing")]
                debug!(session_id = %session_id, update = %update, "Provider notified");
            }
            Ok(Err(_e)) => {
                #[cfg(feature = "tracing")]
                warn!(
                    session_id = %session_id,
                    update = %update,
                    error = %_e,
                    "Provider notification failed"
                );
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                warn!(
                    session_id = %session_id,
                    update = %update,
                    "Provider notification timed out"
                );
            }
        }
    }

    /// Timer path: drop a session that never received a code.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sessions.expire", skip_all, fields(session_id = %session_id))
    )]
    async fn expire(&self, session_id: &SessionId) {
        let Some(slot) = self.store.get(session_id) else {
            return;
        };

        let mut session = slot.lock().await;
        if session.has_received_any() || !session.close(SessionState::Expired) {
            #[cfg(feature = "tracing")]
            debug!(state = %session.state, "Expiry skipped");
            return;
        }
        self.store.remove(session_id, &slot);
        drop(session);

        #[cfg(feature = "tracing")]
        info!(
            timeout_secs = %self.config.session_timeout.as_secs_f64(),
            "Session expired without a code"
        );

        self.notify(session_id, StatusUpdate::Cancel).await;
    }

    /// Close an active session and tell the provider.
    async fn close(
        &self,
        session_id: &SessionId,
        terminal: SessionState,
        update: StatusUpdate,
    ) -> Ack {
        let inactive = Ack {
            session_id: session_id.clone(),
            was_active: false,
        };

        let Some(slot) = self.store.get(session_id) else {
            return inactive;
        };

        let mut session = slot.lock().await;
        if !session.close(terminal) {
            return inactive;
        }
        self.scheduler.cancel(session_id);
        if terminal == SessionState::Finished {
            self.store.mark_succeeded(session_id);
        }
        self.store.remove(session_id, &slot);
        drop(session);

        #[cfg(feature = "tracing")]
        info!(session_id = %session_id, state = %terminal, "Session closed");

        self.notify(session_id, update).await;

        Ack {
            session_id: session_id.clone(),
            was_active: true,
        }
    }
}

impl<P: Provider> SessionManagerTrait for SessionManager<P> {
    type Error = SessionError;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "sessions.acquire",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    async fn acquire(
        &self,
        service: &Service,
        country: CountryId,
    ) -> Result<SessionHandle, Self::Error> {
        let inner = &self.inner;

        if inner.scheduler.is_shut_down() {
            return Err(SessionError::ShutDown);
        }

        let known_price = self
            .check_balance(service, country)
            .await?
            .filter(|price| !price.is_zero());

        let acquisition = inner
            .call(
                "acquire_number",
                service,
                country,
                inner.provider.acquire_number(service, country),
            )
            .await?;

        let (price, pending) = match (known_price, inner.config.price_resolution) {
            (Some(price), _) => (price, false),
            (None, PriceResolution::Synchronous) => {
                let cached = inner.price_for(service, country).await;
                match acquisition.cost {
                    Some(cost) if cached.is_zero() => (cost, false),
                    _ => (cached, false),
                }
            }
            (None, PriceResolution::Deferred) => match acquisition.cost {
                Some(cost) => (cost, false),
                None => (Price::ZERO, true),
            },
        };

        let phone_number = display_number(
            &acquisition.full_number,
            inner.config.dial_code_for(country),
        );

        let session = Session::waiting(
            acquisition.session_id.clone(),
            acquisition.full_number,
            phone_number,
            service.clone(),
            country,
            acquisition.allows_multiple_codes,
        )
        .with_price(price, pending);

        let handle = SessionHandle {
            session_id: session.id.clone(),
            phone_number: session.phone_number.clone(),
            full_number: session.full_number.clone(),
            service: service.clone(),
            country,
            price,
            price_pending: pending,
            allows_multiple_codes: session.allows_multiple_codes,
        };

        // A reissued id names the live session's activation, so a Cancel here would release it.
        let slot = inner
            .store
            .insert(session)
            .ok_or_else(|| SessionError::DuplicateSession {
                session_id: handle.session_id.to_string(),
            })?;

        if !self.arm_expiry(&handle.session_id) {
            // Shut down mid-acquire: nothing would expire it.
            inner.store.remove(&handle.session_id, &slot);
            inner
                .notify(&handle.session_id, StatusUpdate::Cancel)
                .await;
            return Err(SessionError::ShutDown);
        }
        if pending {
            self.resolve_price_later(slot, service.clone(), country);
        }

        #[cfg(feature = "tracing")]
        info!(
            session_id = %handle.session_id,
            phone_number = %handle.phone_number,
            price = %handle.price,
            allows_multiple_codes = handle.allows_multiple_codes,
            "Number acquired"
        );

        Ok(handle)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sessions.poll", skip_all, fields(session_id = %session_id))
    )]
    async fn poll(&self, session_id: &SessionId) -> Result<PollReport, Self::Error> {
        let inner = &self.inner;

        let Some(slot) = inner.store.get(session_id) else {
            #[cfg(feature = "tracing")]
            debug!("Session not found");
            return Ok(PollReport::not_found(session_id));
        };

        let mut session = slot.lock().await;
        if session.state.is_terminal() {
            return Ok(PollReport::not_found(session_id));
        }

        let status = inner
            .call(
                "get_code",
                &session.service,
                session.country,
                inner.provider.get_code(session_id),
            )
            .await?;

        let report = match status {
            CodeStatus::Delivered(code) if session.has_code(&code) => {
                #[cfg(feature = "tracing")]
                debug!(code = %code, "Duplicate code ignored");

                PollReport::from_session(&session, PollStatus::WaitingForNewCode, None)
            }
            CodeStatus::Delivered(code) => {
                // Disarm before any other side effect.
                inner.scheduler.cancel(session_id);

                let _ingest = session.record_code(code.clone());
                let _first_success = inner.store.mark_succeeded(session_id);
                inner.codes_delivered.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "tracing")]
                info!(
                    code = %code,
                    ingest = ?_ingest,
                    first_success = _first_success,
                    "Code received"
                );

                if session.allows_multiple_codes && inner.config.request_additional_codes {
                    inner
                        .notify(session_id, StatusUpdate::RequestAnotherCode)
                        .await;
                    session.mark_awaiting_next();
                }

                PollReport::from_session(&session, PollStatus::CodeReceived, Some(code))
            }
            CodeStatus::Waiting => {
                let status = if session.has_received_any() {
                    PollStatus::WaitingForNewCode
                } else {
                    PollStatus::WaitingForCode
                };
                PollReport::from_session(&session, status, None)
            }
            CodeStatus::Cancelled => {
                session.close(SessionState::Cancelled);
                inner.scheduler.cancel(session_id);
                inner.store.remove(session_id, &slot);

                #[cfg(feature = "tracing")]
                info!("Activation cancelled by provider");

                PollReport::from_session(&session, PollStatus::Cancelled, None)
            }
        };

        Ok(report)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sessions.cancel", skip_all, fields(session_id = %session_id))
    )]
    async fn cancel(&self, session_id: &SessionId) -> Ack {
        self.inner
            .close(session_id, SessionState::Cancelled, StatusUpdate::Cancel)
            .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sessions.finish", skip_all, fields(session_id = %session_id))
    )]
    async fn finish(&self, session_id: &SessionId) -> Ack {
        self.inner
            .close(session_id, SessionState::Finished, StatusUpdate::Finish)
            .await
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            succeeded_count: self.inner.store.succeeded_count(),
            active_count: self.inner.store.len(),
            total_codes_delivered: self.inner.codes_delivered.load(Ordering::Relaxed),
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "sessions.get_price",
            skip_all,
            fields(service = %service, country = %country)
        )
    )]
    async fn get_price(&self, service: &Service, country: CountryId) -> Price {
        self.inner.price_for(service, country).await
    }
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder<P: Provider> {
    provider: P,
    config: SessionManagerConfig,
}

impl<P: Provider> SessionManagerBuilder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: SessionManagerConfig::default(),
        }
    }

    pub fn config(mut self, config: SessionManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> SessionManager<P> {
        SessionManager::new(self.provider, self.config)
    }
}

//! Scripted in-memory provider shared by the integration tests.

#![allow(dead_code)]

use sms_sessions::{
    Acquisition, CodeStatus, CountryId, ErrorCategory, FullNumber, GatewayError, Price, Provider,
    RetryableError, Service, SessionId, SmsCode, StatusUpdate,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MockError {
    #[error("connection reset")]
    Network,
    #[error("NO_NUMBERS")]
    NoNumbers,
    #[error("NO_BALANCE")]
    NoBalance,
    #[error("BAD_KEY")]
    BadKey,
    #[error("unexpected answer")]
    Other,
}

impl RetryableError for MockError {
    fn is_retryable(&self) -> bool {
        matches!(self, MockError::Network)
    }
}

impl GatewayError for MockError {
    fn category(&self) -> ErrorCategory {
        match self {
            MockError::Network => ErrorCategory::Network,
            MockError::NoNumbers => ErrorCategory::NoNumbers,
            MockError::NoBalance => ErrorCategory::NoBalance,
            MockError::BadKey => ErrorCategory::BadKey,
            MockError::Other => ErrorCategory::Other,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get_balance: usize,
    pub get_price: usize,
    pub acquire_number: usize,
    pub get_code: usize,
    pub set_status: usize,
}

struct MockState {
    balance: Result<Price, MockError>,
    price: Result<Option<Price>, MockError>,
    acquire_error: Option<MockError>,
    acquisition_cost: Option<Price>,
    allows_multiple_codes: bool,
    reuse_ids: bool,
    next_id: u64,
    codes: HashMap<SessionId, VecDeque<CodeStatus>>,
    get_code_delay: Option<Duration>,
    set_status_error: Option<MockError>,
    updates: Vec<(SessionId, StatusUpdate)>,
    calls: CallCounts,
}

/// Provider whose answers are scripted per session id.
///
/// `get_code` pops scripted answers in order and keeps repeating the last
/// one; unscripted sessions answer `Waiting`.
#[derive(Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                balance: Ok(price(10.0)),
                price: Ok(Some(price(0.25))),
                acquire_error: None,
                acquisition_cost: None,
                allows_multiple_codes: true,
                reuse_ids: false,
                next_id: 1,
                codes: HashMap::new(),
                get_code_delay: None,
                set_status_error: None,
                updates: Vec::new(),
                calls: CallCounts::default(),
            })),
        }
    }
}

pub fn price(amount: f64) -> Price {
    Price::new(amount).unwrap()
}

pub fn delivered(code: &str) -> CodeStatus {
    CodeStatus::Delivered(SmsCode::new(code))
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn balance(self, amount: f64) -> Self {
        self.with_state(|s| s.balance = Ok(price(amount)))
    }

    pub fn balance_error(self, error: MockError) -> Self {
        self.with_state(|s| s.balance = Err(error))
    }

    pub fn price(self, amount: Option<f64>) -> Self {
        self.with_state(|s| s.price = Ok(amount.map(price)))
    }

    pub fn price_error(self, error: MockError) -> Self {
        self.with_state(|s| s.price = Err(error))
    }

    pub fn acquire_error(self, error: MockError) -> Self {
        self.with_state(|s| s.acquire_error = Some(error))
    }

    pub fn acquisition_cost(self, amount: f64) -> Self {
        self.with_state(|s| s.acquisition_cost = Some(price(amount)))
    }

    pub fn single_code_numbers(self) -> Self {
        self.with_state(|s| s.allows_multiple_codes = false)
    }

    /// Hand out the same activation id on every acquisition.
    pub fn reuse_ids(self) -> Self {
        self.with_state(|s| s.reuse_ids = true)
    }

    pub fn get_code_delay(self, delay: Duration) -> Self {
        self.with_state(|s| s.get_code_delay = Some(delay))
    }

    pub fn set_status_error(self, error: MockError) -> Self {
        self.with_state(|s| s.set_status_error = Some(error))
    }

    /// Replace the scripted `get_code` answers for a session.
    pub fn script(&self, id: &SessionId, answers: Vec<CodeStatus>) {
        self.state
            .lock()
            .unwrap()
            .codes
            .insert(id.clone(), answers.into());
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    pub fn updates(&self) -> Vec<(SessionId, StatusUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn updates_of(&self, kind: StatusUpdate) -> usize {
        self.updates().iter().filter(|(_, u)| *u == kind).count()
    }
}

impl Provider for MockProvider {
    type Error = MockError;

    async fn get_balance(&self) -> Result<Price, MockError> {
        let mut s = self.state.lock().unwrap();
        s.calls.get_balance += 1;
        s.balance.clone()
    }

    async fn get_price(
        &self,
        _service: &Service,
        _country: CountryId,
    ) -> Result<Option<Price>, MockError> {
        let mut s = self.state.lock().unwrap();
        s.calls.get_price += 1;
        s.price.clone()
    }

    async fn acquire_number(
        &self,
        _service: &Service,
        _country: CountryId,
    ) -> Result<Acquisition, MockError> {
        let mut s = self.state.lock().unwrap();
        s.calls.acquire_number += 1;
        if let Some(error) = s.acquire_error.clone() {
            return Err(error);
        }

        let id = s.next_id;
        if !s.reuse_ids {
            s.next_id += 1;
        }
        Ok(Acquisition {
            session_id: SessionId::new(id.to_string()),
            full_number: FullNumber::from(format!("55119{:08}", id)),
            allows_multiple_codes: s.allows_multiple_codes,
            cost: s.acquisition_cost,
        })
    }

    async fn get_code(&self, session_id: &SessionId) -> Result<CodeStatus, MockError> {
        let (delay, answer) = {
            let mut s = self.state.lock().unwrap();
            s.calls.get_code += 1;
            let answer = match s.codes.get_mut(session_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            (s.get_code_delay, answer.unwrap_or(CodeStatus::Waiting))
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(answer)
    }

    async fn set_status(
        &self,
        session_id: &SessionId,
        update: StatusUpdate,
    ) -> Result<(), MockError> {
        let mut s = self.state.lock().unwrap();
        s.calls.set_status += 1;
        s.updates.push((session_id.clone(), update));
        match s.set_status_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

//! Session record and its state machine.

use crate::types::{CountryId, FullNumber, Price, Service, SessionId, SmsCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifecycle state of a rented number.
///
/// ```text
/// Waiting ──code──▶ CodeReceived ──retry requested──▶ AwaitingNextCode
///    │                   │    ▲                              │
///    │                   │    └────────────new code──────────┘
///    └──timeout──▶ Expired
/// any active ──cancel──▶ Cancelled
/// any active ──finish──▶ Finished
/// ```
///
/// Terminal states are never stored: a session reaching one is removed
/// from the store in the same critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Waiting,
    CodeReceived,
    AwaitingNextCode,
    Cancelled,
    Finished,
    Expired,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished | Self::Expired)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::CodeReceived => "code_received",
            Self::AwaitingNextCode => "awaiting_next_code",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// A code delivered to the session's number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCode {
    pub code: SmsCode,
    pub received_at: DateTime<Utc>,
    /// 1-based arrival position.
    pub ordinal: usize,
}

/// Result of offering a delivered code to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeIngest {
    /// Appended at the given ordinal.
    New { ordinal: usize },
    /// Already present; nothing changed.
    Duplicate,
}

/// One rented phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Number with the country dial code, as issued by the provider.
    pub full_number: FullNumber,
    /// Number shown to the caller (dial code stripped when known).
    pub phone_number: String,
    pub service: Service,
    pub country: CountryId,
    /// Rental cost. Zero while `price_pending` is set.
    pub price: Price,
    /// The price is still being resolved in the background.
    pub price_pending: bool,
    pub state: SessionState,
    pub received_codes: Vec<ReceivedCode>,
    pub allows_multiple_codes: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// A freshly acquired session in [`SessionState::Waiting`].
    pub(crate) fn waiting(
        id: SessionId,
        full_number: FullNumber,
        phone_number: String,
        service: Service,
        country: CountryId,
        allows_multiple_codes: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_number,
            phone_number,
            service,
            country,
            price: Price::ZERO,
            price_pending: false,
            state: SessionState::Waiting,
            received_codes: Vec::new(),
            allows_multiple_codes,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub(crate) fn with_price(mut self, price: Price, pending: bool) -> Self {
        self.price = price;
        self.price_pending = pending;
        self
    }

    pub fn has_code(&self, code: &SmsCode) -> bool {
        self.received_codes.iter().any(|rc| &rc.code == code)
    }

    pub fn has_received_any(&self) -> bool {
        !self.received_codes.is_empty()
    }

    /// Most recently delivered code.
    pub fn last_code(&self) -> Option<&SmsCode> {
        self.received_codes.last().map(|rc| &rc.code)
    }

    /// Whether another code can still arrive on this number.
    pub fn more_codes_possible(&self) -> bool {
        match self.state {
            SessionState::Waiting | SessionState::AwaitingNextCode => true,
            SessionState::CodeReceived => self.allows_multiple_codes,
            _ => false,
        }
    }

    /// Offer a delivered code. Duplicates leave the session untouched.
    pub(crate) fn record_code(&mut self, code: SmsCode) -> CodeIngest {
        if self.has_code(&code) {
            return CodeIngest::Duplicate;
        }

        let now = Utc::now();
        let ordinal = self.received_codes.len() + 1;
        self.received_codes.push(ReceivedCode {
            code,
            received_at: now,
            ordinal,
        });
        self.state = SessionState::CodeReceived;
        self.last_activity_at = now;

        CodeIngest::New { ordinal }
    }

    /// Move to [`SessionState::AwaitingNextCode`] after another code was requested.
    pub(crate) fn mark_awaiting_next(&mut self) {
        if self.state == SessionState::CodeReceived {
            self.state = SessionState::AwaitingNextCode;
            self.touch();
        }
    }

    /// Enter a terminal state.
    ///
    /// Returns false when the session was already closed.
    pub(crate) fn close(&mut self, terminal: SessionState) -> bool {
        debug_assert!(terminal.is_terminal());
        if self.state.is_terminal() {
            return false;
        }
        self.state = terminal;
        self.touch();
        true
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(allows_multiple_codes: bool) -> Session {
        Session::waiting(
            SessionId::from("42"),
            FullNumber::from("5511955551234"),
            "11955551234".to_string(),
            Service::Microsoft,
            CountryId::new(73),
            allows_multiple_codes,
        )
    }

    #[test]
    fn test_new_session_is_waiting() {
        let s = session(true);
        assert_eq!(s.state, SessionState::Waiting);
        assert!(s.received_codes.is_empty());
        assert!(s.more_codes_possible());
        assert_eq!(s.created_at, s.last_activity_at);
    }

    #[test]
    fn test_record_code_appends_in_order() {
        let mut s = session(true);

        assert_eq!(
            s.record_code(SmsCode::new("1234")),
            CodeIngest::New { ordinal: 1 }
        );
        s.mark_awaiting_next();
        assert_eq!(s.state, SessionState::AwaitingNextCode);

        assert_eq!(
            s.record_code(SmsCode::new("5678")),
            CodeIngest::New { ordinal: 2 }
        );
        assert_eq!(s.state, SessionState::CodeReceived);

        let codes: Vec<_> = s.received_codes.iter().map(|rc| rc.code.as_str()).collect();
        assert_eq!(codes, vec!["1234", "5678"]);
        assert_eq!(s.last_code(), Some(&SmsCode::new("5678")));
    }

    #[test]
    fn test_duplicate_code_changes_nothing() {
        let mut s = session(true);
        s.record_code(SmsCode::new("1234"));
        s.mark_awaiting_next();
        let before = s.clone();

        assert_eq!(s.record_code(SmsCode::new("1234")), CodeIngest::Duplicate);
        assert_eq!(s, before);
    }

    #[test]
    fn test_single_code_session_stays_code_received() {
        let s = {
            let mut s = session(false);
            s.record_code(SmsCode::new("1234"));
            s
        };
        assert_eq!(s.state, SessionState::CodeReceived);
        assert!(!s.more_codes_possible());
    }

    #[test]
    fn test_close_once() {
        let mut s = session(false);
        assert!(s.close(SessionState::Cancelled));
        assert!(!s.close(SessionState::Finished));
        assert_eq!(s.state, SessionState::Cancelled);
        assert!(!s.more_codes_possible());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionState::AwaitingNextCode).unwrap(),
            r#""awaiting_next_code""#
        );
        assert!(SessionState::Expired.is_terminal());
        assert!(SessionState::CodeReceived.is_active());
    }
}

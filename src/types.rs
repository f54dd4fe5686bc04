//! Core value types for rented number sessions.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// SessionId
// =============================================================================

/// Identifier of a rented number session.
///
/// Issued by the provider when a number is acquired (the activation id) and
/// used as the primary key of the session for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// SmsCode (OTP)
// =============================================================================

/// Verification code delivered to a rented number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmsCode(String);

impl SmsCode {
    /// Create a new SmsCode. Surrounding whitespace is trimmed.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_string())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SmsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SmsCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SmsCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// =============================================================================
// FullNumber
// =============================================================================

/// Full phone number with country code (e.g., "5511987654321").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullNumber(String);

impl FullNumber {
    /// Create a new FullNumber. A leading '+' is dropped.
    pub fn new(number: impl AsRef<str>) -> Self {
        Self(number.as_ref().trim().trim_start_matches('+').to_string())
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Format the number with a leading '+'.
    pub fn with_plus_prefix(&self) -> String {
        format!("+{}", self.0)
    }
}

impl Display for FullNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FullNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for FullNumber {
    fn from(number: String) -> Self {
        Self::new(number)
    }
}

impl From<&str> for FullNumber {
    fn from(number: &str) -> Self {
        Self::new(number)
    }
}

// =============================================================================
// DialCode
// =============================================================================

/// Error when parsing a dial code.
#[derive(Debug, Clone, Error)]
pub enum DialCodeError {
    /// Dial code contains non-digit characters.
    #[error("dial code must contain only digits")]
    NonDigit,
    /// Dial code is empty.
    #[error("dial code cannot be empty")]
    Empty,
}

/// Country dial code (e.g., "55" for Brazil), stored without the leading '+'.
///
/// ```rust
/// use sms_sessions::DialCode;
///
/// let dc = DialCode::new("+55").unwrap();
/// assert_eq!(dc.to_string(), "55");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialCode(String);

impl DialCode {
    /// Create a new DialCode; a leading '+' is stripped.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DialCodeError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if n.is_empty() {
            return Err(DialCodeError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(DialCodeError::NonDigit);
        }
        Ok(Self(n.to_string()))
    }

    /// Get the dial code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DialCode {
    type Err = DialCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DialCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DialCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        DialCode::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for DialCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// Number
// =============================================================================

/// Error when parsing a national phone number.
#[derive(Debug, Clone, Error)]
pub enum NumberError {
    /// Number contains non-digit characters.
    #[error("number must contain only digits")]
    NonDigit,
    /// Number has invalid length.
    #[error("number must be between 4 and 14 digits")]
    InvalidLength,
    /// Number starts with zero.
    #[error("number cannot start with 0")]
    LeadingZero,
    /// Dial code not found at the beginning.
    #[error("dial code not found at the beginning of the number")]
    MissingDialCode,
}

/// National part of a phone number, without the country dial code.
///
/// Must contain 4 to 14 digits and cannot start with 0.
///
/// ```rust
/// use sms_sessions::{DialCode, FullNumber, Number};
///
/// let dial_code = DialCode::new("55").unwrap();
/// let full = FullNumber::new("5511987654321");
/// let num = Number::from_full_number(&full, &dial_code).unwrap();
/// assert_eq!(num.to_string(), "11987654321");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Number(String);

impl Number {
    /// Create a new Number from a string.
    pub fn new(s: impl AsRef<str>) -> Result<Self, NumberError> {
        let s = s.as_ref().trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(NumberError::NonDigit);
        }
        if !(4..=14).contains(&s.len()) {
            return Err(NumberError::InvalidLength);
        }
        if s.starts_with('0') {
            return Err(NumberError::LeadingZero);
        }
        Ok(Self(s.to_string()))
    }

    /// Extract the national number from a full number by removing the dial code prefix.
    pub fn from_full_number(full: &FullNumber, dial_code: &DialCode) -> Result<Self, NumberError> {
        let number_part = full
            .as_str()
            .strip_prefix(dial_code.as_str())
            .ok_or(NumberError::MissingDialCode)?;

        Self::new(number_part)
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Number {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Price
// =============================================================================

/// Error when parsing a price.
#[derive(Debug, Clone, Error)]
pub enum PriceError {
    /// Not a decimal number.
    #[error("price '{raw}' is not a number")]
    NotANumber { raw: String },
    /// Negative or non-finite amount.
    #[error("price must be a finite, non-negative amount")]
    OutOfRange,
}

/// Decimal places kept when a price is built from a float.
const FLOAT_SCALE: u32 = 8;

/// Amount in the provider account currency (rental cost or balance).
///
/// Backed by a decimal so that sums such as price plus margin compare
/// exactly against a balance. A zero price is the "unknown" placeholder
/// used when the provider could not be asked for the price.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Create a price from a non-negative decimal amount.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::OutOfRange);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a finite, non-negative float.
    ///
    /// The float is rounded to 8 decimal places, so `0.2` becomes exactly
    /// `0.2`.
    pub fn new(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PriceError::OutOfRange);
        }
        let amount = Decimal::from_f64_retain(amount).ok_or(PriceError::OutOfRange)?;
        Self::from_decimal(amount.round_dp(FLOAT_SCALE))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|_| PriceError::NotANumber { raw: s.to_string() })?;
        Self::from_decimal(amount)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// =============================================================================
// CountryId
// =============================================================================

/// Provider-side numeric country identifier (e.g., 73 for Brazil on Hero SMS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(u16);

impl CountryId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Display for CountryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for CountryId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service a number is rented for (the site or app that sends the code).
///
/// Codes follow the sms-activate protocol family used by Hero SMS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Service {
    /// Microsoft (code: "mm").
    #[default]
    Microsoft,
    /// WhatsApp (code: "wa").
    Whatsapp,
    /// Telegram (code: "tg").
    Telegram,
    /// Instagram/Threads (code: "ig").
    InstagramThreads,
    /// Facebook (code: "fb").
    Facebook,
    /// Google/Gmail/YouTube (code: "go").
    Google,
    /// Other/custom service.
    Other { code: String },
}

impl Service {
    /// Get the service code for the API.
    pub fn code(&self) -> &str {
        match self {
            Service::Microsoft => "mm",
            Service::Whatsapp => "wa",
            Service::Telegram => "tg",
            Service::InstagramThreads => "ig",
            Service::Facebook => "fb",
            Service::Google => "go",
            Service::Other { code } => code.as_str(),
        }
    }

    /// Create a Service from a code string.
    pub fn from_code<S: AsRef<str>>(code: S) -> Self {
        match code.as_ref().trim() {
            "mm" => Service::Microsoft,
            "wa" => Service::Whatsapp,
            "tg" => Service::Telegram,
            "ig" => Service::InstagramThreads,
            "fb" => Service::Facebook,
            "go" => Service::Google,
            other => Service::Other {
                code: other.to_string(),
            },
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Service {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Service::from_code(s))
    }
}

impl Serialize for Service {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Service::from_code(s))
    }
}

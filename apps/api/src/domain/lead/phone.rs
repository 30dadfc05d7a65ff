use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Loose E.164 shape: `+`, a non-zero leading digit, 7 to 15 digits total
static E164_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("E.164 pattern compiles"));

/// Country code prefixes recognised on a cleaned digit string
const EXPLICIT_PREFIXES: &[&str] = &["44", "39", "33", "49"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("Phone number is empty")]
    Empty,

    #[error("Invalid phone number format: {0}")]
    InvalidFormat(String),
}

/// Phone number value object in E.164 format
///
/// # Invariants
/// - Always starts with `+`
/// - Matches the loose E.164 shape `^\+[1-9]\d{6,14}$`
///
/// # Example
/// ```
/// use dialwave_api::domain::lead::PhoneNumber;
///
/// let phone = PhoneNumber::parse("079 4614 5678").expect("uk national");
/// assert_eq!(phone.as_str(), "+447946145678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes a free-form phone string and validates the result
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let normalized = normalize(raw)?;
        if E164_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(PhoneError::InvalidFormat(raw.trim().to_string()))
        }
    }

    /// Accepts a value that is already E.164, without re-normalizing it
    pub fn from_e164(value: &str) -> Result<Self, PhoneError> {
        let value = value.trim();
        if E164_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(PhoneError::InvalidFormat(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

/// Converts a free-form phone string into E.164 form
///
/// Every non-digit is stripped, then the first matching rule wins:
/// 1. A recognised country code (`1` at length 11, `44`, `356` at length 11,
///    `39`, `33`, `49`) is kept as-is
/// 2. 8 digits starting with `9` or `7` are Malta mobiles (`+356`)
/// 3. 10 digits default to the UK (`+44`)
/// 4. 11 digits with a leading `0` are UK national format (`0` replaced by `+44`)
/// 5. Anything else is assumed to already carry its country code
///
/// The result is not validated; see [`PhoneNumber::parse`].
pub fn normalize(raw: &str) -> Result<String, PhoneError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    let len = digits.len();

    if has_country_code(&digits) {
        return Ok(format!("+{}", digits));
    }

    if len == 8 && (digits.starts_with('9') || digits.starts_with('7')) {
        return Ok(format!("+356{}", digits));
    }

    if len == 10 {
        return Ok(format!("+44{}", digits));
    }

    if len == 11 && digits.starts_with('0') {
        return Ok(format!("+44{}", &digits[1..]));
    }

    Ok(format!("+{}", digits))
}

fn has_country_code(digits: &str) -> bool {
    let len = digits.len();
    (digits.starts_with('1') && len == 11)
        || (digits.starts_with("356") && len == 11)
        || EXPLICIT_PREFIXES.iter().any(|prefix| digits.starts_with(prefix))
}

/// Checks a string against the loose E.164 shape without normalizing it
pub fn is_e164(candidate: &str) -> bool {
    E164_PATTERN.is_match(candidate)
}

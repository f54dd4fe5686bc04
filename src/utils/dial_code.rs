//! Dial code lookup and national number extraction.

use crate::types::{DialCode, FullNumber, Number};
use keshvar::Alpha2;

/// International dialing code of an ISO country.
pub fn dial_code_for(alpha2: Alpha2) -> Option<DialCode> {
    let country = alpha2.to_country();
    DialCode::new(country.country_code().to_string()).ok()
}

/// Number as shown to the caller: the dial code prefix stripped when it matches.
///
/// Falls back to the full number when no dial code is configured or the
/// number does not start with it.
pub(crate) fn display_number(full: &FullNumber, dial_code: Option<&DialCode>) -> String {
    dial_code
        .and_then(|dc| Number::from_full_number(full, dc).ok())
        .map(|number| number.to_string())
        .unwrap_or_else(|| full.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_code_for_country() {
        assert_eq!(
            dial_code_for(Alpha2::BR).map(|dc| dc.to_string()),
            Some("55".to_string())
        );
        assert_eq!(
            dial_code_for(Alpha2::US).map(|dc| dc.to_string()),
            Some("1".to_string())
        );
        assert_eq!(
            dial_code_for(Alpha2::UA).map(|dc| dc.to_string()),
            Some("380".to_string())
        );
    }

    #[test]
    fn test_display_number_strips_matching_prefix() {
        let full = FullNumber::new("5511955551234");
        let dc = DialCode::new("55").unwrap();
        assert_eq!(display_number(&full, Some(&dc)), "11955551234");
    }

    #[test]
    fn test_display_number_keeps_full_number_otherwise() {
        let full = FullNumber::new("4479460001234");
        let dc = DialCode::new("55").unwrap();
        assert_eq!(display_number(&full, Some(&dc)), "4479460001234");
        assert_eq!(display_number(&full, None), "4479460001234");
    }
}

//! Short, human-typeable session codes.
//!
//! Codes are six symbols drawn from a 32-symbol alphabet that leaves out the
//! visually ambiguous `I`, `O`, `0` and `1`. Input is accepted in any case and
//! with surrounding whitespace; the stored form is always uppercase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Symbols a session code may contain.
pub const SESSION_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of symbols in a session code.
pub const SESSION_CODE_LEN: usize = 6;

/// A canonical (uppercase) session code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    /// Parse user input into a canonical code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed input is not exactly
    /// six characters from [`SESSION_CODE_ALPHABET`] (case-insensitive).
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let canonical = input.trim().to_ascii_uppercase();
        if canonical.len() != SESSION_CODE_LEN {
            return Err(DomainError::validation(format!(
                "Session code must be {} characters",
                SESSION_CODE_LEN
            )));
        }
        if let Some(bad) = canonical
            .bytes()
            .find(|b| !SESSION_CODE_ALPHABET.contains(b))
        {
            return Err(DomainError::validation(format!(
                "Session code contains invalid character '{}'",
                bad as char
            )));
        }
        Ok(Self(canonical))
    }

    /// Build a code by sampling the alphabet six times.
    ///
    /// `pick(n)` must return an index in `0..n`; out-of-range values wrap.
    /// Randomness is injected so the domain stays free of an RNG dependency.
    pub fn generate(mut pick: impl FnMut(usize) -> usize) -> Self {
        let alphabet_len = SESSION_CODE_ALPHABET.len();
        let code = (0..SESSION_CODE_LEN)
            .map(|_| SESSION_CODE_ALPHABET[pick(alphabet_len) % alphabet_len] as char)
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> String {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(code: &str) -> bool {
        code.len() == SESSION_CODE_LEN
            && code
                .bytes()
                .all(|b| matches!(b, b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z' | b'2'..=b'9'))
    }

    #[test]
    fn parse_canonicalizes_case_and_whitespace() {
        let code = SessionCode::parse("  k7hq2x ").unwrap();
        assert_eq!(code.as_str(), "K7HQ2X");
    }

    #[test]
    fn parse_rejects_ambiguous_symbols() {
        for bad in ["ABCDE0", "ABCDE1", "ABCDEI", "ABCDEO", "abcdeo"] {
            assert!(SessionCode::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(SessionCode::parse("").is_err());
        assert!(SessionCode::parse("ABCDE").is_err());
        assert!(SessionCode::parse("ABCDEFG").is_err());
    }

    #[test]
    fn generate_uses_only_the_alphabet() {
        let mut counter = 0usize;
        for _ in 0..64 {
            let code = SessionCode::generate(|n| {
                counter += 7;
                counter % n
            });
            assert!(is_canonical(code.as_str()), "{code} is not canonical");
        }
    }

    #[test]
    fn generate_wraps_out_of_range_picks() {
        let code = SessionCode::generate(|n| n + 1);
        assert_eq!(code.as_str(), "BBBBBB");
    }

    #[test]
    fn serde_round_trip_keeps_uppercase_form() {
        let code: SessionCode = serde_json::from_str("\"abcdef\"").unwrap();
        assert_eq!(code.as_str(), "ABCDEF");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"ABCDEF\"");
        assert!(serde_json::from_str::<SessionCode>("\"AB\"").is_err());
    }
}

//! Digit buffer and the completed PIN value.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::pin::error::PinError;

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// A fully captured PIN.
///
/// The digits are wiped from memory on drop and never appear in `Debug`
/// output. Equality is constant-time.
#[derive(Clone)]
pub struct PinCode(Zeroizing<String>);

impl PinCode {
    /// Parses a PIN from exactly [`PIN_LENGTH`] ASCII digits.
    pub fn parse(value: &str) -> Result<Self, PinError> {
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_digit()) {
            return Err(PinError::InvalidDigit(bad));
        }
        if value.len() != PIN_LENGTH {
            return Err(PinError::IncompletePin {
                expected: PIN_LENGTH,
                actual: value.len(),
            });
        }
        Ok(Self(Zeroizing::new(value.to_string())))
    }

    /// Returns the digits for transmission to the authorization service.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PinCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for PinCode {}

impl std::fmt::Debug for PinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PinCode({})", "*".repeat(self.0.len()))
    }
}

/// Ordered sequence of digits with a fixed capacity.
///
/// Invariant: holds at most `capacity` characters, all in `'0'..='9'`.
pub struct DigitBuffer {
    digits: Zeroizing<String>,
    capacity: usize,
}

impl Default for DigitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DigitBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl DigitBuffer {
    /// Creates an empty buffer of [`PIN_LENGTH`] digits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(PIN_LENGTH)
    }

    /// Creates an empty buffer holding up to `capacity` digits.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            digits: Zeroizing::new(String::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends a digit.
    ///
    /// Returns `Ok(false)` without changing anything when the buffer is full.
    pub fn append(&mut self, digit: char) -> Result<bool, PinError> {
        if !digit.is_ascii_digit() {
            return Err(PinError::InvalidDigit(digit));
        }
        if self.is_full() {
            return Ok(false);
        }
        self.digits.push(digit);
        Ok(true)
    }

    /// Removes the last digit, returning whether one was removed.
    pub fn backspace(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    /// Empties the buffer and wipes its storage.
    pub fn clear(&mut self) {
        self.digits.zeroize();
    }

    /// Number of digits entered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Returns true when no digit has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns true when the buffer holds `capacity` digits.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.digits.len() == self.capacity
    }

    /// Maximum number of digits.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the captured PIN once the buffer is full.
    #[must_use]
    pub fn code(&self) -> Option<PinCode> {
        self.is_full()
            .then(|| PinCode(Zeroizing::new(self.digits.as_str().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(digits: &str) -> DigitBuffer {
        let mut buffer = DigitBuffer::new();
        for d in digits.chars() {
            buffer.append(d).unwrap();
        }
        buffer
    }

    #[test]
    fn test_append_until_full() {
        let mut buffer = DigitBuffer::new();
        assert!(buffer.is_empty());
        for d in ['1', '2', '3', '4'] {
            assert!(buffer.append(d).unwrap());
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), PIN_LENGTH);
    }

    #[test]
    fn test_append_when_full_is_noop() {
        let mut buffer = filled("1234");
        assert!(!buffer.append('5').unwrap());
        assert_eq!(buffer.code().unwrap().expose(), "1234");
    }

    #[test]
    fn test_append_rejects_non_digit() {
        let mut buffer = DigitBuffer::new();
        assert!(matches!(buffer.append('a'), Err(PinError::InvalidDigit('a'))));
        assert!(matches!(buffer.append('٣'), Err(PinError::InvalidDigit(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_backspace() {
        let mut buffer = filled("12");
        assert!(buffer.backspace());
        assert_eq!(buffer.len(), 1);
        assert!(buffer.backspace());
        assert!(!buffer.backspace());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = filled("987");
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.append('1').unwrap());
    }

    #[test]
    fn test_code_only_when_full() {
        assert!(filled("123").code().is_none());
        assert_eq!(filled("0042").code().unwrap().expose(), "0042");
    }

    #[test]
    fn test_pin_code_parse() {
        assert_eq!(PinCode::parse("5678").unwrap().expose(), "5678");
        assert!(matches!(
            PinCode::parse("567"),
            Err(PinError::IncompletePin { expected: 4, actual: 3 })
        ));
        assert!(matches!(PinCode::parse("56a8"), Err(PinError::InvalidDigit('a'))));
    }

    #[test]
    fn test_pin_code_equality_is_exact() {
        let a = PinCode::parse("1111").unwrap();
        assert_eq!(a, PinCode::parse("1111").unwrap());
        assert_ne!(a, PinCode::parse("1112").unwrap());
    }

    #[test]
    fn test_debug_never_shows_digits() {
        let code = PinCode::parse("4321").unwrap();
        assert_eq!(format!("{code:?}"), "PinCode(****)");
        assert!(!format!("{:?}", filled("4321")).contains("4321"));
    }
}

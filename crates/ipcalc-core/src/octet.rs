//! A single 8-bit component of an IPv4 address

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use crate::{AddressError, Result};

/// One of the four 8-bit components of an IPv4 address.
///
/// A validated octet always holds a value in `0..=255`. The
/// [`unchecked`](Octet::unchecked) constructor admits values outside that
/// range; it exists solely as scratch state for [`Address`](crate::Address)
/// carry propagation, which resolves the excess before any validated value is
/// produced.
///
/// # Examples
///
/// ```
/// use ipcalc_core::Octet;
///
/// let octet = Octet::new(192).unwrap();
/// assert_eq!(octet.binary(), "11000000");
/// assert_eq!(octet.to_string(), "192");
///
/// assert!(Octet::new(256).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Octet {
    value: i64,
}

impl Octet {
    /// Create a range-checked octet.
    pub fn new(value: i64) -> Result<Self> {
        if !(0..=255).contains(&value) {
            return Err(AddressError::Range(format!(
                "octet value out of range 0-255: {value}"
            )));
        }
        Ok(Self { value })
    }

    /// Create an octet without range validation.
    ///
    /// Only address carry propagation should use this; the out-of-range value
    /// must be resolved before it can appear inside a validated address.
    pub fn unchecked(value: i64) -> Self {
        Self { value }
    }

    /// Parse an octet from text.
    ///
    /// An 8-character string of `'0'`/`'1'` digits is read as binary; any
    /// other string is parsed as a decimal integer.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let value = if is_binary_octet(s) {
            i64::from_str_radix(s, 2).expect("validated 8-bit binary string")
        } else {
            s.parse::<i64>().map_err(|_| {
                AddressError::Format(format!("octet is neither decimal nor 8-bit binary: {s:?}"))
            })?
        };
        Self::new(value)
    }

    /// Raw value, possibly outside `0..=255` for unchecked octets.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Whether the value is within the canonical octet range.
    pub fn in_range(&self) -> bool {
        (0..=255).contains(&self.value)
    }

    /// Zero-padded 8-bit binary representation.
    ///
    /// Meaningful only for in-range values; carry scratch state must be
    /// resolved before asking for binary form.
    pub fn binary(&self) -> String {
        debug_assert!(self.in_range(), "binary form of out-of-range octet: {}", self.value);
        format!("{:08b}", self.value)
    }
}

/// Check for an exactly-8-character string of binary digits.
fn is_binary_octet(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b == b'0' || b == b'1')
}

impl fmt::Display for Octet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl PartialEq for Octet {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Octet {}

impl PartialOrd for Octet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Octet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialEq<i64> for Octet {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl PartialOrd<i64> for Octet {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

impl Add<i64> for Octet {
    type Output = Octet;

    /// Addition yields an unchecked octet; the caller resolves any carry.
    fn add(self, rhs: i64) -> Octet {
        Octet::unchecked(self.value + rhs)
    }
}

impl Sub<i64> for Octet {
    type Output = Octet;

    /// Subtraction yields an unchecked octet; the caller resolves any borrow.
    fn sub(self, rhs: i64) -> Octet {
        Octet::unchecked(self.value - rhs)
    }
}

impl Add<Octet> for Octet {
    type Output = Octet;

    fn add(self, rhs: Octet) -> Octet {
        self + rhs.value
    }
}

impl Sub<Octet> for Octet {
    type Output = Octet;

    fn sub(self, rhs: Octet) -> Octet {
        self - rhs.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_in_range() {
        assert_eq!(Octet::new(0).unwrap().value(), 0);
        assert_eq!(Octet::new(255).unwrap().value(), 255);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(Octet::new(-1).is_err());
        assert!(Octet::new(256).is_err());
    }

    #[test]
    fn test_unchecked_allows_out_of_range() {
        let octet = Octet::unchecked(300);
        assert_eq!(octet.value(), 300);
        assert!(!octet.in_range());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Octet::parse("192").unwrap().value(), 192);
        assert_eq!(Octet::parse("0").unwrap().value(), 0);
    }

    #[test]
    fn test_parse_binary() {
        assert_eq!(Octet::parse("11000000").unwrap().value(), 192);
        assert_eq!(Octet::parse("00000000").unwrap().value(), 0);
        assert_eq!(Octet::parse("11111111").unwrap().value(), 255);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Octet::parse("abc").is_err());
        assert!(Octet::parse("1100000").is_err()); // 7 digits, not binary form
        assert!(Octet::parse("").is_err());
    }

    #[test]
    fn test_binary_is_zero_padded() {
        assert_eq!(Octet::new(1).unwrap().binary(), "00000001");
        assert_eq!(Octet::new(255).unwrap().binary(), "11111111");
    }

    #[test]
    #[should_panic(expected = "out-of-range octet")]
    fn test_binary_rejects_unresolved_carry_state() {
        let _ = Octet::unchecked(-5).binary();
    }

    #[test]
    fn test_comparisons() {
        let a = Octet::new(10).unwrap();
        let b = Octet::new(20).unwrap();
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a, Octet::new(10).unwrap());
        assert!(a == 10);
        assert!(a < 11);
    }

    #[test]
    fn test_arithmetic_returns_unchecked() {
        let octet = Octet::new(250).unwrap();
        let sum = octet + 10;
        assert_eq!(sum.value(), 260);
        assert!(!sum.in_range());

        let diff = Octet::new(5).unwrap() - 10;
        assert_eq!(diff.value(), -5);
    }

    #[test]
    fn test_octet_plus_octet() {
        let a = Octet::new(100).unwrap();
        let b = Octet::new(55).unwrap();
        assert_eq!((a + b).value(), 155);
        assert_eq!((a - b).value(), 45);
    }
}

//! Ripple-carry arithmetic on binary digit strings
//!
//! These helpers operate on arbitrary-length strings of `'0'`/`'1'` digits,
//! most-significant digit first. They back [`Address`](crate::Address)
//! arithmetic, where sub-spans of the 32-bit form are adjusted in place
//! without disturbing neighbouring bits.

use crate::{AddressError, Result};

/// Add two binary digit strings.
///
/// Both operands are left-padded with zeros to the length of the longer one;
/// the sum is returned at that same width. A carry out of the top digit is
/// dropped, so the operation wraps at the aligned width rather than growing.
///
/// # Examples
///
/// ```
/// use ipcalc_core::binary::binary_add;
///
/// assert_eq!(binary_add("010", "1").unwrap(), "011");
/// assert_eq!(binary_add("010", "011").unwrap(), "101");
/// ```
pub fn binary_add(a: &str, b: &str) -> Result<String> {
    let (a, b) = align(a, b)?;
    let mut out = vec![b'0'; a.len()];
    let mut carry = 0u8;
    for i in (0..a.len()).rev() {
        let sum = (a[i] - b'0') + (b[i] - b'0') + carry;
        out[i] = b'0' + (sum & 1);
        carry = sum >> 1;
    }
    // carry out of the top digit is dropped: fixed-width wraparound
    Ok(String::from_utf8(out).expect("binary digits are ASCII"))
}

/// Subtract binary digit string `b` from `a`.
///
/// Operands are aligned as in [`binary_add`]; the result is trimmed of
/// leading zeros, keeping a single `"0"` when the difference is exactly zero.
///
/// # Examples
///
/// ```
/// use ipcalc_core::binary::binary_sub;
///
/// assert_eq!(binary_sub("010", "1").unwrap(), "1");
/// assert_eq!(binary_sub("110", "110").unwrap(), "0");
/// ```
pub fn binary_sub(a: &str, b: &str) -> Result<String> {
    let (a, b) = align(a, b)?;
    let mut out = vec![b'0'; a.len()];
    let mut borrow = 0i8;
    for i in (0..a.len()).rev() {
        let mut diff = (a[i] - b'0') as i8 - (b[i] - b'0') as i8 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 2;
            borrow = 1;
        }
        out[i] = b'0' + diff as u8;
    }
    let out = String::from_utf8(out).expect("binary digits are ASCII");
    let trimmed = out.trim_start_matches('0');
    Ok(if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    })
}

/// Left-zero-pad both operands to the length of the longer one.
fn align(a: &str, b: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    check_digits(a)?;
    check_digits(b)?;
    let width = a.len().max(b.len());
    let pad = |s: &str| {
        let mut v = vec![b'0'; width - s.len()];
        v.extend_from_slice(s.as_bytes());
        v
    };
    Ok((pad(a), pad(b)))
}

fn check_digits(s: &str) -> Result<()> {
    if s.is_empty() || !s.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(AddressError::Format(format!(
            "not a binary digit string: {s:?}"
        )));
    }
    Ok(())
}

//! 32-bit IPv4 address and mask representation

use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::binary::binary_add;
use crate::{AddressError, Octet, Result};

/// An IPv4 address: exactly 4 octets, most-significant first.
///
/// An address may additionally be flagged as a mask. The flag is set either
/// explicitly (construction from a prefix length) or by post-construction
/// detection: any address whose 32-bit binary form is a contiguous run of
/// 1-bits followed by 0-bits qualifies. The detection is deliberate and
/// applies to every constructor, so `255.255.255.0` parsed from dotted form
/// is a mask, and so are degenerate patterns like `0.0.0.0` and `255.0.0.0`.
///
/// Addresses are value types: comparison uses the unsigned 32-bit
/// interpretation of the binary form, and arithmetic returns new instances.
///
/// # Examples
///
/// ```
/// use ipcalc_core::Address;
///
/// let addr = Address::parse("192.168.0.52").unwrap();
/// assert_eq!(addr.binary(), "11000000101010000000000000110100");
/// assert!(!addr.is_mask());
///
/// let mask = Address::parse("255.255.240.0").unwrap();
/// assert!(mask.is_mask());
/// assert_eq!(mask.prefix_len().unwrap(), 20);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Address {
    octets: [Octet; 4],
    mask: bool,
}

impl Address {
    /// Parse an address from text.
    ///
    /// Dispatch, in order:
    /// 1. contains `.` - four dot-separated parts, each decimal or 8-bit
    ///    binary
    /// 2. 32 characters of `'0'`/`'1'` - the full binary form
    /// 3. all-digit decimal in `0..=30` - a mask prefix length
    ///
    /// Anything else is a format error.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains('.') {
            let parts: Vec<&str> = s.split('.').collect();
            if parts.len() != 4 {
                return Err(AddressError::Format(format!(
                    "expected 4 dot-separated octets: {s:?}"
                )));
            }
            let octets = [
                Octet::parse(parts[0])?,
                Octet::parse(parts[1])?,
                Octet::parse(parts[2])?,
                Octet::parse(parts[3])?,
            ];
            Ok(Self::assemble(octets, false))
        } else if s.len() == 32 && s.bytes().all(|b| b == b'0' || b == b'1') {
            Self::from_binary(s)
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let len: u8 = s
                .parse()
                .map_err(|_| AddressError::Format(format!("prefix length out of range: {s:?}")))?;
            Self::from_prefix_len(len)
        } else {
            Err(AddressError::Format(format!("not an address: {s:?}")))
        }
    }

    /// Expand a CIDR prefix length (`0..=30`) into the corresponding mask.
    pub fn from_prefix_len(len: u8) -> Result<Self> {
        if len > 30 {
            return Err(AddressError::Range(format!(
                "prefix length out of range 0-30: {len}"
            )));
        }
        let bits = format!("{}{}", "1".repeat(len as usize), "0".repeat(32 - len as usize));
        let mut addr = Self::from_binary(&bits)?;
        addr.mask = true;
        Ok(addr)
    }

    /// Build an address from a 32-character binary digit string.
    pub fn from_binary(bits: &str) -> Result<Self> {
        if bits.len() != 32 || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(AddressError::Format(format!(
                "expected 32 binary digits: {bits:?}"
            )));
        }
        let octets = [
            Octet::parse(&bits[0..8])?,
            Octet::parse(&bits[8..16])?,
            Octet::parse(&bits[16..24])?,
            Octet::parse(&bits[24..32])?,
        ];
        Ok(Self::assemble(octets, false))
    }

    /// Build an address from 4 octets, re-validating each one.
    ///
    /// This accepts unchecked octets and rejects any that remain outside
    /// `0..=255`, so carry propagation cannot leak scratch state into a
    /// finished address.
    pub fn from_octets(octets: [Octet; 4]) -> Result<Self> {
        for octet in &octets {
            if !octet.in_range() {
                return Err(AddressError::Range(format!(
                    "octet value out of range 0-255: {}",
                    octet.value()
                )));
            }
        }
        Ok(Self::assemble(octets, false))
    }

    /// Build an address from 4 plain byte values.
    pub fn from_values(values: [u8; 4]) -> Self {
        let octets = values.map(|v| Octet::unchecked(i64::from(v)));
        Self::assemble(octets, false)
    }

    /// Finish construction: apply mask auto-detection.
    fn assemble(octets: [Octet; 4], mask: bool) -> Self {
        let mut addr = Self { octets, mask };
        if !addr.mask && !addr.binary().contains("01") {
            addr.mask = true;
        }
        addr
    }

    /// The four octets, most-significant first.
    pub fn octets(&self) -> &[Octet; 4] {
        &self.octets
    }

    /// Whether this address is flagged as a mask.
    pub fn is_mask(&self) -> bool {
        self.mask
    }

    /// 32-character binary representation, most-significant bit first.
    pub fn binary(&self) -> String {
        let mut out = String::with_capacity(32);
        for octet in &self.octets {
            out.push_str(&octet.binary());
        }
        out
    }

    /// CIDR prefix length: the count of 1-bits in the binary form.
    ///
    /// Only a mask has a meaningful prefix length; for any other address
    /// this is a [`NotMask`](AddressError::NotMask) error.
    pub fn prefix_len(&self) -> Result<u32> {
        if !self.mask {
            return Err(AddressError::NotMask(self.to_string()));
        }
        Ok(self.as_u32().count_ones())
    }

    /// Add `n`, rippling carries from the least-significant octet leftward.
    ///
    /// Stepping past `255.255.255.255` is a range error, not a wraparound.
    pub fn checked_add(&self, n: u32) -> Result<Self> {
        self.offset(i64::from(n)).map_err(|_| {
            AddressError::Range(format!("cannot add {n} to {self}: value too high"))
        })
    }

    /// Subtract `n`, rippling borrows from the least-significant octet
    /// leftward.
    ///
    /// Stepping below `0.0.0.0` is a range error, not a wraparound.
    pub fn checked_sub(&self, n: u32) -> Result<Self> {
        self.offset(-i64::from(n)).map_err(|_| {
            AddressError::Range(format!("cannot subtract {n} from {self}: value too low"))
        })
    }

    /// Shared carry/borrow loop for [`checked_add`](Self::checked_add) and
    /// [`checked_sub`](Self::checked_sub).
    fn offset(&self, delta: i64) -> Result<Self> {
        let mut octets = self.octets;
        octets[3] = octets[3] + delta;
        for i in (1..4).rev() {
            let value = octets[i].value();
            let carry = value.div_euclid(256);
            if carry != 0 {
                octets[i] = Octet::unchecked(value.rem_euclid(256));
                octets[i - 1] = octets[i - 1] + carry;
            }
        }
        // a carry or borrow past the most-significant octet exhausts the
        // address space
        Self::from_octets(octets)
    }

    /// Add `value` only within the bit-span covered by `diff_mask`.
    ///
    /// The span runs from the first 1-bit of the difference mask to one past
    /// its last 1-bit; bits outside the span are untouched. This advances a
    /// subnet's slot index independently of the fixed network and host bits.
    pub fn increment_with_difference_mask(&self, diff_mask: &Address, value: u64) -> Result<Self> {
        let bits = self.binary();
        let mask = diff_mask.binary();
        let start = mask.find('1').ok_or_else(|| {
            AddressError::Format(format!("difference mask has no set bits: {diff_mask}"))
        })?;
        let end = mask.rfind('1').expect("a found 1-bit also has a last position") + 1;

        let span = binary_add(&bits[start..end], &format!("{value:b}"))?;
        Self::from_binary(&format!("{}{}{}", &bits[..start], span, &bits[end..]))
    }

    fn as_u32(&self) -> u32 {
        self.octets
            .iter()
            .fold(0u32, |acc, octet| (acc << 8) | octet.value() as u32)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.octets[0], self.octets[1], self.octets[2], self.octets[3]
        )
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<[u8; 4]> for Address {
    fn from(values: [u8; 4]) -> Self {
        Self::from_values(values)
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self::from_values(ip.octets())
    }
}

impl From<Address> for Ipv4Addr {
    fn from(addr: Address) -> Self {
        let [a, b, c, d] = addr.octets.map(|o| o.value() as u8);
        Ipv4Addr::new(a, b, c, d)
    }
}

// The mask flag is presentation state, not identity: two addresses are equal
// when their 32-bit values are equal.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.as_u32() == other.as_u32()
    }
}

impl Eq for Address {}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u32().cmp(&other.as_u32())
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_u32().hash(state);
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AddressVisitor;

        impl Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an IPv4 address string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Address, E> {
                Address::parse(v).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

//! Network and subnet derivation
//!
//! Builds on [`ipcalc_core::Address`] to derive network boundaries from an
//! address + mask pair:
//! - Network and broadcast addresses
//! - Host counts and host range enumeration
//! - Difference masks between two mask granularities
//! - Partitioning a network into equally-sized subnets
//!
//! A [`Network`] is fully derived at construction time and immutable
//! afterwards; a different mask means a different `Network` value.
//!
//! # Examples
//!
//! ```
//! use ipcalc_core::Address;
//! use ipcalc_net::Network;
//!
//! let addr = Address::parse("192.168.0.52").unwrap();
//! let mask = Address::parse("255.255.255.0").unwrap();
//! let network = Network::new(addr, mask).unwrap();
//!
//! assert_eq!(network.net_addr().to_string(), "192.168.0.0");
//! assert_eq!(network.broadcast_addr().to_string(), "192.168.0.255");
//! assert_eq!(network.host_count(), 254);
//! ```

use ipcalc_core::{Address, AddressError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Network derivation errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Mask bits are not a contiguous leading run of 1s
    #[error("Not a valid mask: {0} (mask bits must be contiguous)")]
    InvalidMask(String),

    /// An address without the mask property was supplied where a mask is
    /// required
    #[error("Not a mask address: {0}")]
    NotAMask(String),

    /// Underlying address arithmetic failed
    #[error(transparent)]
    Address(#[from] AddressError),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

/// An IPv4 network: any member address plus a validated mask.
///
/// Construction eagerly derives the network address, broadcast address and
/// host count; the values never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Network {
    addr: Address,
    mask: Address,
    net_addr: Address,
    broadcast_addr: Address,
    host_count: u64,
}

impl Network {
    /// Derive a network from a member address and a mask.
    ///
    /// The mask must carry the mask property and its binary form must never
    /// contain a `0` followed by a `1` (all 1-bits contiguous from the top).
    ///
    /// # Examples
    ///
    /// ```
    /// use ipcalc_core::Address;
    /// use ipcalc_net::Network;
    ///
    /// let network = Network::new(
    ///     Address::parse("10.1.2.3").unwrap(),
    ///     Address::from_prefix_len(8).unwrap(),
    /// ).unwrap();
    /// assert_eq!(network.net_addr().to_string(), "10.0.0.0");
    /// ```
    pub fn new(addr: Address, mask: Address) -> Result<Self> {
        validate_mask(&mask)?;
        let net_addr = apply_mask(&mask, &addr)?;
        let broadcast_addr = broadcast(&mask, &addr)?;
        let prefix_len = mask.prefix_len().map_err(NetworkError::Address)?;
        // 2^(32-prefix) - 2; /31 and /32 have no room for net+broadcast, so
        // the usable host count saturates at zero
        let host_count = (1u64 << (32 - prefix_len)).saturating_sub(2);
        Ok(Self {
            addr,
            mask,
            net_addr,
            broadcast_addr,
            host_count,
        })
    }

    /// The member address the network was derived from.
    pub fn addr(&self) -> Address {
        self.addr
    }

    /// The network mask.
    pub fn mask(&self) -> Address {
        self.mask
    }

    /// The address with all host bits zeroed.
    pub fn net_addr(&self) -> Address {
        self.net_addr
    }

    /// The address with all host bits set.
    pub fn broadcast_addr(&self) -> Address {
        self.broadcast_addr
    }

    /// Number of usable host addresses (`2^(32-prefix) - 2`).
    pub fn host_count(&self) -> u64 {
        self.host_count
    }

    /// CIDR prefix length of the mask.
    pub fn prefix_len(&self) -> u32 {
        // the mask was validated at construction
        self.mask.prefix_len().unwrap_or(0)
    }

    /// All addresses of the network in ascending order, network and
    /// broadcast addresses included.
    pub fn addresses(&self) -> AddressIter {
        AddressIter::new(self.net_addr, self.broadcast_addr)
    }

    /// Usable host addresses: [`addresses`](Self::addresses) without the
    /// network and broadcast addresses.
    pub fn hosts(&self) -> Vec<Address> {
        let all: Vec<Address> = self.addresses().collect();
        if all.len() <= 2 {
            return Vec::new();
        }
        all[1..all.len() - 1].to_vec()
    }

    /// Whether the given address falls inside this network's range.
    pub fn contains(&self, addr: &Address) -> bool {
        *addr >= self.net_addr && *addr <= self.broadcast_addr
    }

    /// XOR of this network's mask with a finer mask.
    ///
    /// The result marks the bit positions that distinguish the two mask
    /// granularities; it drives subnet stepping in
    /// [`subnets`](Self::subnets).
    ///
    /// # Examples
    ///
    /// ```
    /// use ipcalc_core::Address;
    /// use ipcalc_net::Network;
    ///
    /// let network = Network::new(
    ///     Address::parse("192.168.0.0").unwrap(),
    ///     Address::from_prefix_len(24).unwrap(),
    /// ).unwrap();
    /// let diff = network
    ///     .difference_mask(&Address::from_prefix_len(26).unwrap())
    ///     .unwrap();
    /// assert_eq!(diff.to_string(), "0.0.0.192");
    /// ```
    pub fn difference_mask(&self, sub_mask: &Address) -> Result<Address> {
        if !sub_mask.is_mask() {
            return Err(NetworkError::NotAMask(sub_mask.to_string()));
        }
        validate_mask(sub_mask)?;
        let own = self.mask.binary();
        let sub = sub_mask.binary();
        let bits: String = own
            .chars()
            .zip(sub.chars())
            .map(|(a, b)| if a != b { '1' } else { '0' })
            .collect();
        Ok(Address::from_binary(&bits)?)
    }

    /// Partition this network into subnets of the given finer mask.
    ///
    /// Produces `2^|own_prefix - sub_prefix|` subnets in ascending address
    /// order, contiguous and non-overlapping: a disjoint cover of the parent
    /// range.
    pub fn subnets(&self, sub_mask: &Address) -> Result<Vec<SubNetwork>> {
        validate_mask(sub_mask)?;
        let own_prefix = self.mask.prefix_len().map_err(NetworkError::Address)?;
        let sub_prefix = sub_mask.prefix_len().map_err(NetworkError::Address)?;
        let count = 1u64 << own_prefix.abs_diff(sub_prefix);

        let diff_mask = self.difference_mask(sub_mask)?;
        let mut subnets = Vec::with_capacity(count as usize);
        let mut cursor = self.net_addr;
        for i in 0..count {
            subnets.push(SubNetwork::new(self, cursor, *sub_mask)?);
            if i + 1 < count {
                cursor = cursor.increment_with_difference_mask(&diff_mask, 1)?;
            }
        }
        Ok(subnets)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.net_addr, self.prefix_len())
    }
}

/// A subnet produced by partitioning a parent [`Network`].
///
/// The subnet's own address is re-derived by applying the subnet's own mask
/// to the supplied address bits, independent of the parent's coarser mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubNetwork {
    parent_net_addr: Address,
    parent_mask: Address,
    network: Network,
}

impl SubNetwork {
    fn new(parent: &Network, addr: Address, mask: Address) -> Result<Self> {
        let own_addr = derive_subnet_address(&mask, &addr)?;
        let network = Network::new(own_addr, mask)?;
        Ok(Self {
            parent_net_addr: parent.net_addr,
            parent_mask: parent.mask,
            network,
        })
    }

    /// The parent network's address.
    pub fn parent_net_addr(&self) -> Address {
        self.parent_net_addr
    }

    /// The parent network's mask.
    pub fn parent_mask(&self) -> Address {
        self.parent_mask
    }

    /// The subnet viewed as a plain network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn net_addr(&self) -> Address {
        self.network.net_addr()
    }

    pub fn broadcast_addr(&self) -> Address {
        self.network.broadcast_addr()
    }

    pub fn mask(&self) -> Address {
        self.network.mask()
    }

    pub fn host_count(&self) -> u64 {
        self.network.host_count()
    }
}

impl fmt::Display for SubNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.network.fmt(f)
    }
}

/// Zero the bits of `addr` not covered by `mask`.
///
/// This is both the network-address derivation and the re-derivation a
/// subnet applies with its own narrower mask.
pub fn derive_subnet_address(mask: &Address, addr: &Address) -> Result<Address> {
    apply_mask(mask, addr)
}

fn apply_mask(mask: &Address, addr: &Address) -> Result<Address> {
    let m = mask.binary();
    let a = addr.binary();
    let bits: String = m
        .chars()
        .zip(a.chars())
        .map(|(mb, ab)| if mb == '0' { '0' } else { ab })
        .collect();
    Ok(Address::from_binary(&bits)?)
}

fn broadcast(mask: &Address, addr: &Address) -> Result<Address> {
    let m = mask.binary();
    let a = addr.binary();
    let bits: String = m
        .chars()
        .zip(a.chars())
        .map(|(mb, ab)| if mb == '0' { '1' } else { ab })
        .collect();
    Ok(Address::from_binary(&bits)?)
}

/// Reject masks whose 1-bits are not contiguous from the top.
fn validate_mask(mask: &Address) -> Result<()> {
    if mask.binary().contains("01") {
        return Err(NetworkError::InvalidMask(mask.to_string()));
    }
    Ok(())
}

/// Ascending iterator over an inclusive address range.
pub struct AddressIter {
    current: Option<Address>,
    end: Address,
}

impl AddressIter {
    fn new(start: Address, end: Address) -> Self {
        Self {
            current: Some(start),
            end,
        }
    }
}

impl Iterator for AddressIter {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = if current < self.end {
            current.checked_add(1).ok()
        } else {
            None
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_network_derivation() {
        let network = Network::new(addr("192.168.0.52"), addr("255.255.255.0")).unwrap();
        assert_eq!(network.net_addr(), addr("192.168.0.0"));
        assert_eq!(network.broadcast_addr(), addr("192.168.0.255"));
        assert_eq!(network.host_count(), 254);
        assert_eq!(network.prefix_len(), 24);
    }

    #[test]
    fn test_network_from_prefix_mask() {
        let network = Network::new(addr("10.1.2.3"), Address::from_prefix_len(8).unwrap()).unwrap();
        assert_eq!(network.net_addr(), addr("10.0.0.0"));
        assert_eq!(network.broadcast_addr(), addr("10.255.255.255"));
        assert_eq!(network.host_count(), 16_777_214);
    }

    #[test]
    fn test_rejects_non_contiguous_mask() {
        let result = Network::new(addr("192.168.0.1"), addr("255.0.255.0"));
        assert!(matches!(result, Err(NetworkError::InvalidMask(_))));
    }

    #[test]
    fn test_addresses_inclusive_of_both_ends() {
        let network = Network::new(addr("192.168.0.0"), addr("255.255.255.252")).unwrap();
        let all: Vec<Address> = network.addresses().collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], addr("192.168.0.0"));
        assert_eq!(all[3], addr("192.168.0.3"));
    }

    #[test]
    fn test_hosts_drop_network_and_broadcast() {
        let network = Network::new(addr("192.168.0.0"), addr("255.255.255.252")).unwrap();
        let hosts = network.hosts();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0], addr("192.168.0.1"));
        assert_eq!(hosts[1], addr("192.168.0.2"));
        assert_eq!(hosts.len() as u64, network.host_count());
    }

    #[test]
    fn test_host_count_matches_enumeration() {
        let network = Network::new(addr("10.0.0.0"), addr("255.255.255.0")).unwrap();
        assert_eq!(network.addresses().count(), 256);
        assert_eq!(network.hosts().len() as u64, network.host_count());
    }

    #[test]
    fn test_enumeration_is_ascending() {
        let network = Network::new(addr("10.0.0.0"), addr("255.255.255.240")).unwrap();
        let all: Vec<Address> = network.addresses().collect();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_contains() {
        let network = Network::new(addr("192.168.1.0"), addr("255.255.255.0")).unwrap();
        assert!(network.contains(&addr("192.168.1.0")));
        assert!(network.contains(&addr("192.168.1.130")));
        assert!(network.contains(&addr("192.168.1.255")));
        assert!(!network.contains(&addr("192.168.2.0")));
        assert!(!network.contains(&addr("192.168.0.255")));
    }

    #[test]
    fn test_difference_mask() {
        let network = Network::new(addr("192.168.0.0"), addr("24")).unwrap();
        let diff = network.difference_mask(&addr("26")).unwrap();
        assert_eq!(diff, addr("0.0.0.192"));
    }

    #[test]
    fn test_difference_mask_rejects_non_mask() {
        let network = Network::new(addr("192.168.0.0"), addr("24")).unwrap();
        let result = network.difference_mask(&addr("192.168.0.7"));
        assert!(matches!(result, Err(NetworkError::NotAMask(_))));
    }

    #[test]
    fn test_subnet_partition() {
        let network = Network::new(addr("192.168.0.0"), addr("255.255.255.0")).unwrap();
        let subnets = network.subnets(&addr("255.255.255.192")).unwrap();

        assert_eq!(subnets.len(), 4);
        let nets: Vec<String> = subnets.iter().map(|s| s.net_addr().to_string()).collect();
        assert_eq!(
            nets,
            vec!["192.168.0.0", "192.168.0.64", "192.168.0.128", "192.168.0.192"]
        );

        // contiguous and non-overlapping: each broadcast is one below the
        // next network address
        for pair in subnets.windows(2) {
            assert_eq!(
                pair[0].broadcast_addr().checked_add(1).unwrap(),
                pair[1].net_addr()
            );
        }
        assert_eq!(subnets[0].net_addr(), network.net_addr());
        assert_eq!(subnets[3].broadcast_addr(), network.broadcast_addr());
    }

    #[test]
    fn test_subnet_parent_links() {
        let network = Network::new(addr("192.168.0.0"), addr("24")).unwrap();
        let subnets = network.subnets(&addr("26")).unwrap();
        for subnet in &subnets {
            assert_eq!(subnet.parent_net_addr(), network.net_addr());
            assert_eq!(subnet.parent_mask(), network.mask());
            assert_eq!(subnet.host_count(), 62);
        }
    }

    #[test]
    fn test_subnet_rederives_own_address() {
        // a /26 subnet handed a host address re-applies its own mask
        let derived =
            derive_subnet_address(&addr("255.255.255.192"), &addr("192.168.0.77")).unwrap();
        assert_eq!(derived, addr("192.168.0.64"));
    }

    #[test]
    fn test_identity_partition() {
        let network = Network::new(addr("10.0.0.0"), addr("24")).unwrap();
        let subnets = network.subnets(&addr("24")).unwrap();
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].net_addr(), network.net_addr());
    }

    #[test]
    fn test_display() {
        let network = Network::new(addr("192.168.0.52"), addr("255.255.255.0")).unwrap();
        assert_eq!(network.to_string(), "192.168.0.0/24");
    }

    #[test]
    fn test_serialize() {
        let network = Network::new(addr("192.168.0.52"), addr("255.255.255.0")).unwrap();
        let json = serde_json::to_value(&network).unwrap();
        assert_eq!(json["net_addr"], "192.168.0.0");
        assert_eq!(json["broadcast_addr"], "192.168.0.255");
        assert_eq!(json["host_count"], 254);
    }
}

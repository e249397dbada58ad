//! Core types for IPv4 address and mask arithmetic
//!
//! This crate provides the foundational types used throughout the ipcalc
//! workspace:
//! - [`Octet`] - A single validated 8-bit address component
//! - [`Address`] - A 32-bit IPv4 address or mask built from 4 octets
//! - [`Port`] - An address paired with a 16-bit port number
//! - [`binary`] - Ripple-carry arithmetic on binary digit strings
//!
//! All arithmetic is synchronous and side-effect free: operations return new
//! values rather than mutating in place, and every constructor validates its
//! input atomically so no partially-built value is ever observable.
//!
//! # Examples
//!
//! ```
//! use ipcalc_core::Address;
//!
//! let addr = Address::parse("192.168.0.1").unwrap();
//! let next = addr.checked_add(1).unwrap();
//! assert_eq!(next.to_string(), "192.168.0.2");
//!
//! let mask = Address::from_prefix_len(24).unwrap();
//! assert_eq!(mask.to_string(), "255.255.255.0");
//! assert_eq!(mask.prefix_len().unwrap(), 24);
//! ```

use thiserror::Error;

pub mod binary;

mod address;
mod octet;
mod port;

pub use address::Address;
pub use octet::Octet;
pub use port::Port;

/// Errors raised by address and octet operations
#[derive(Error, Debug)]
pub enum AddressError {
    /// Malformed textual input: wrong component count, non-numeric octet,
    /// invalid binary length
    #[error("Invalid address format: {0}")]
    Format(String),

    /// Octet or arithmetic result outside representable bounds
    #[error("Value out of range: {0}")]
    Range(String),

    /// Integer form requested of an address that is not a mask
    #[error("Not representable as prefix length: {0}")]
    NotMask(String),
}

/// Result type alias for core address operations
pub type Result<T> = std::result::Result<T, AddressError>;

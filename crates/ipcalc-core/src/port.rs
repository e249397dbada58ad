//! Address + port value pair

use std::fmt;
use std::net::SocketAddrV4;

use serde::{Deserialize, Serialize};

use crate::Address;

/// An [`Address`] paired with a 16-bit port number.
///
/// Only the data shape lives here; the "is this port open" probe is external
/// I/O and belongs to the probe layer, keeping the arithmetic core free of
/// network dependencies.
///
/// # Examples
///
/// ```
/// use ipcalc_core::{Address, Port};
///
/// let addr = Address::parse("192.168.0.1").unwrap();
/// let port = Port::new(addr, 22);
/// assert_eq!(port.to_string(), "192.168.0.1:22");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    addr: Address,
    number: u16,
}

impl Port {
    /// Pair an address with a port number.
    pub fn new(addr: Address, number: u16) -> Self {
        Self { addr, number }
    }

    /// The address half of the pair.
    pub fn addr(&self) -> Address {
        self.addr
    }

    /// The port number.
    pub fn number(&self) -> u16 {
        self.number
    }

    /// The standard-library socket address form.
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.addr.into(), self.number)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.number)
    }
}

//! Private address pools for network identifier obfuscation.
//!
//! Allocation is sequential: the Nth distinct address seen in a run receives
//! the Nth address of its pool. Pools never wrap.

use crate::canonicalize::MacAddr;
use crate::{Category, RedactionError, Result};
use std::net::{Ipv4Addr, Ipv6Addr};

/// First IPv4 address handed out.
pub const IPV4_POOL_START: Ipv4Addr = Ipv4Addr::new(10, 230, 230, 1);
/// Last IPv4 address handed out.
pub const IPV4_POOL_END: Ipv4Addr = Ipv4Addr::new(10, 255, 255, 254);

/// First IPv6 address handed out (inside a ULA /48).
pub const IPV6_POOL_START: Ipv6Addr = Ipv6Addr::new(0xfd7e, 0xa1c3, 0x9b00, 0, 0, 0, 0, 1);
/// Last IPv6 address handed out.
pub const IPV6_POOL_END: Ipv6Addr =
    Ipv6Addr::new(0xfd7e, 0xa1c3, 0x9b00, 0, 0xffff, 0xffff, 0xffff, 0xfffe);

/// First MAC address handed out (locally administered, unicast).
pub const MAC_POOL_START: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
/// Last MAC address handed out.
pub const MAC_POOL_END: MacAddr = MacAddr([0x02, 0xff, 0xff, 0xff, 0xff, 0xfe]);

/// A monotonic range of numeric addresses.
#[derive(Debug, Clone)]
pub struct AddressPool {
    category: Category,
    next: u128,
    last: u128,
}

impl AddressPool {
    /// Create a pool covering `first..=last`.
    pub fn new(category: Category, first: u128, last: u128) -> Self {
        Self {
            category,
            next: first,
            last,
        }
    }

    pub fn ipv4() -> Self {
        Self::new(
            Category::Ipv4,
            u32::from(IPV4_POOL_START) as u128,
            u32::from(IPV4_POOL_END) as u128,
        )
    }

    pub fn ipv6() -> Self {
        Self::new(
            Category::Ipv6,
            u128::from(IPV6_POOL_START),
            u128::from(IPV6_POOL_END),
        )
    }

    pub fn mac() -> Self {
        Self::new(
            Category::Mac,
            MAC_POOL_START.to_u64() as u128,
            MAC_POOL_END.to_u64() as u128,
        )
    }

    /// Take the next address.
    pub fn allocate(&mut self) -> Result<u128> {
        if self.next > self.last {
            return Err(RedactionError::PoolExhausted {
                category: self.category,
            });
        }
        let value = self.next;
        self.next += 1;
        Ok(value)
    }

    /// Number of addresses still available.
    pub fn remaining(&self) -> u128 {
        if self.next > self.last {
            0
        } else {
            self.last - self.next + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_pool_starts_at_first_address() {
        let mut pool = AddressPool::ipv4();
        let first = pool.allocate().unwrap();
        let second = pool.allocate().unwrap();
        assert_eq!(Ipv4Addr::from(first as u32), Ipv4Addr::new(10, 230, 230, 1));
        assert_eq!(Ipv4Addr::from(second as u32), Ipv4Addr::new(10, 230, 230, 2));
    }

    #[test]
    fn test_pool_crosses_octet_boundary() {
        let start = u32::from(Ipv4Addr::new(10, 230, 230, 255)) as u128;
        let mut pool = AddressPool::new(Category::Ipv4, start, start + 1);
        pool.allocate().unwrap();
        let next = pool.allocate().unwrap();
        assert_eq!(Ipv4Addr::from(next as u32), Ipv4Addr::new(10, 230, 231, 0));
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut pool = AddressPool::new(Category::Mac, 1, 2);
        assert_eq!(pool.remaining(), 2);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert_eq!(pool.remaining(), 0);

        let err = pool.allocate().unwrap_err();
        assert!(matches!(
            err,
            RedactionError::PoolExhausted {
                category: Category::Mac
            }
        ));
        // Still exhausted, never wraps.
        assert!(pool.allocate().is_err());
    }

    #[test]
    fn test_ipv6_and_mac_pool_bounds() {
        let mut v6 = AddressPool::ipv6();
        assert_eq!(
            Ipv6Addr::from(v6.allocate().unwrap()).to_string(),
            "fd7e:a1c3:9b00::1"
        );
        let mut mac = AddressPool::mac();
        assert_eq!(
            MacAddr::from_u64(mac.allocate().unwrap() as u64).to_string(),
            "02:00:00:00:00:01"
        );
    }
}

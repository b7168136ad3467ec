//! Machine identity derived from the host's private IPv4 addresses.
//!
//! The default machine id is the low two octets of one private address
//! followed by the low byte of the process id:
//!
//! ```text
//! ip 192.168.3.7, pid 0x1234  =>  0x03_07_34
//! ```
//!
//! Only addresses in 10.0.0.0/8, 172.16.0.0/12 and 192.168.0.0/16 qualify.
//! When several interfaces qualify the default [`RandomSelection`] picks one
//! at random, so the id may differ between restarts. Use [`FirstMatch`] or
//! [`PrefixMatch`] where it has to be stable.

use {
    pnet::datalink,
    rand::seq::IndexedRandom,
    std::net::{IpAddr, Ipv4Addr},
};

/// A list of addresses assigned to the local interfaces.
pub trait AddressSource {
    fn addresses(&self) -> Vec<IpAddr>;
}

/// Reads addresses from the operating system's network interfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAddresses;

impl AddressSource for SystemAddresses {
    fn addresses(&self) -> Vec<IpAddr> {
        datalink::interfaces()
            .into_iter()
            .flat_map(|iface| iface.ips)
            .map(|network| network.ip())
            .collect()
    }
}

impl AddressSource for Vec<IpAddr> {
    fn addresses(&self) -> Vec<IpAddr> {
        self.clone()
    }
}

impl AddressSource for [IpAddr] {
    fn addresses(&self) -> Vec<IpAddr> {
        self.to_vec()
    }
}

impl<S: AddressSource + ?Sized> AddressSource for &S {
    fn addresses(&self) -> Vec<IpAddr> {
        (**self).addresses()
    }
}

/// Picks one address out of the private candidates.
pub trait SelectionStrategy {
    fn select(&self, candidates: &[Ipv4Addr]) -> Option<Ipv4Addr>;
}

/// Uniformly random choice.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn select(&self, candidates: &[Ipv4Addr]) -> Option<Ipv4Addr> {
        candidates.choose(&mut rand::rng()).copied()
    }
}

/// The first candidate in interface order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstMatch;

impl SelectionStrategy for FirstMatch {
    fn select(&self, candidates: &[Ipv4Addr]) -> Option<Ipv4Addr> {
        candidates.first().copied()
    }
}

/// The first candidate whose leading octets equal the prefix.
///
/// Prefixes longer than four octets are cut to four.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    prefix: Vec<u8>,
}

impl PrefixMatch {
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: prefix[.. prefix.len().min(4)].to_vec(),
        }
    }

    pub fn matches(&self, addr: &Ipv4Addr) -> bool {
        addr.octets().starts_with(&self.prefix)
    }
}

impl SelectionStrategy for PrefixMatch {
    fn select(&self, candidates: &[Ipv4Addr]) -> Option<Ipv4Addr> {
        candidates.iter().find(|addr| self.matches(addr)).copied()
    }
}

/// Derives the default machine id.
///
/// # Examples
///
/// ```
/// use std::net::IpAddr;
/// use hostflake::{FirstMatch, Resolver};
///
/// let addrs: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap(), "10.0.3.7".parse().unwrap()];
/// let machine_id = Resolver::with(addrs, FirstMatch).resolve();
///
/// assert_eq!(machine_id >> 8, 0x0307);
/// assert_eq!(machine_id & 0xFF, std::process::id() & 0xFF);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Resolver<S = SystemAddresses, P = RandomSelection> {
    source: S,
    strategy: P,
    pid_fallback: bool,
}

impl Resolver {
    /// System interfaces, random selection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: AddressSource, P: SelectionStrategy> Resolver<S, P> {
    pub fn with(source: S, strategy: P) -> Self {
        Self {
            source,
            strategy,
            pid_fallback: false,
        }
    }

    /// When no private address is found, resolve to the low process id byte
    /// instead of zero.
    pub fn pid_fallback(mut self, enabled: bool) -> Self {
        self.pid_fallback = enabled;
        self
    }

    /// Returns the 24-bit machine id, or zero when no private address exists
    /// and the pid fallback is off.
    pub fn resolve(&self) -> u32 {
        let pid = std::process::id() & 0xFF;
        let candidates = private_ipv4s(&self.source);

        match self.strategy.select(&candidates) {
            Some(addr) => {
                let [_, _, hi, lo] = addr.octets();
                let machine_id = (u32::from(hi) << 16) | (u32::from(lo) << 8) | pid;
                tracing::debug!(%addr, machine_id, "resolved machine id");
                machine_id
            }
            None if self.pid_fallback => {
                tracing::warn!(pid, "no private ipv4 address found, machine id from pid only");
                pid
            }
            None => {
                tracing::warn!("no private ipv4 address found, machine id defaults to 0");
                0
            }
        }
    }
}

/// The non-loopback private IPv4 addresses of `source`, in source order.
pub fn private_ipv4s<S: AddressSource + ?Sized>(source: &S) -> Vec<Ipv4Addr> {
    source
        .addresses()
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        })
        .filter(|addr| !addr.is_loopback() && addr.is_private())
        .collect()
}

/// The first private IPv4 address of this host starting with `prefix`.
///
/// An empty prefix matches any private address.
///
/// ```no_run
/// let addr = hostflake::find_local_address(&[192, 168]);
/// println!("{addr:?}");
/// ```
pub fn find_local_address(prefix: &[u8]) -> Option<Ipv4Addr> {
    find_local_address_in(&SystemAddresses, prefix)
}

/// Same as [`find_local_address`] over any address source.
pub fn find_local_address_in<S: AddressSource + ?Sized>(source: &S, prefix: &[u8]) -> Option<Ipv4Addr> {
    PrefixMatch::new(prefix).select(&private_ipv4s(source))
}

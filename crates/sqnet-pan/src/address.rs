//! SCION addresses.
//!
//! - [`IsdAsn`]: `<isd>-<asn>`, e.g. `1-ff00:0:110` or `2-64512`.
//! - [`UdpAddr`]: `<isd-as>,<ip>:<port>`, e.g. `1-ff00:0:110,[::1]:8080`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddressError;

/// Largest AS number representable in the 48-bit ASN field.
const MAX_ASN: u64 = (1 << 48) - 1;
/// AS numbers up to this value are written in decimal (BGP-compatible).
const MAX_BGP_ASN: u64 = u32::MAX as u64;

/// ISD-AS pair identifying an autonomous system in the SCION network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsdAsn {
    isd: u16,
    asn: u64,
}

impl IsdAsn {
    /// Wildcard `0-0`, matching any AS.
    pub const WILDCARD: Self = Self { isd: 0, asn: 0 };

    /// Create an ISD-AS pair. Fails if `asn` does not fit in 48 bits.
    pub fn new(isd: u16, asn: u64) -> Result<Self, AddressError> {
        if asn > MAX_ASN {
            return Err(AddressError::InvalidIsdAsn(format!(
                "AS number {asn} exceeds 48 bits"
            )));
        }
        Ok(Self { isd, asn })
    }

    pub const fn isd(&self) -> u16 {
        self.isd
    }

    pub const fn asn(&self) -> u64 {
        self.asn
    }

    pub const fn is_wildcard(&self) -> bool {
        self.isd == 0 && self.asn == 0
    }
}

impl fmt::Display for IsdAsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asn <= MAX_BGP_ASN {
            write!(f, "{}-{}", self.isd, self.asn)
        } else {
            write!(
                f,
                "{}-{:x}:{:x}:{:x}",
                self.isd,
                (self.asn >> 32) & 0xffff,
                (self.asn >> 16) & 0xffff,
                self.asn & 0xffff
            )
        }
    }
}

impl FromStr for IsdAsn {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidIsdAsn(s.to_string());

        let (isd, asn) = s.split_once('-').ok_or_else(invalid)?;
        let isd: u16 = isd.parse().map_err(|_| invalid())?;

        let asn = if asn.contains(':') {
            let mut value = 0u64;
            let mut groups = 0;
            for group in asn.split(':') {
                if group.is_empty() || group.len() > 4 {
                    return Err(invalid());
                }
                let group = u16::from_str_radix(group, 16).map_err(|_| invalid())?;
                value = (value << 16) | u64::from(group);
                groups += 1;
            }
            if groups != 3 {
                return Err(invalid());
            }
            value
        } else {
            let value: u64 = asn.parse().map_err(|_| invalid())?;
            if value > MAX_BGP_ASN {
                return Err(invalid());
            }
            value
        };

        Ok(Self { isd, asn })
    }
}

impl Serialize for IsdAsn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsdAsn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// UDP endpoint in the SCION network: an AS plus a host address within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UdpAddr {
    ia: IsdAsn,
    addr: SocketAddr,
}

impl UdpAddr {
    pub const fn new(ia: IsdAsn, addr: SocketAddr) -> Self {
        Self { ia, addr }
    }

    pub const fn ia(&self) -> IsdAsn {
        self.ia
    }

    pub const fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Host address within the AS.
    pub const fn socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl fmt::Display for UdpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.ia, self.addr)
    }
}

impl FromStr for UdpAddr {
    type Err = AddressError;

    /// Accepts `ia,ip:port`, `ia,[ipv6]:port` and the legacy `ia,[ipv4]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidUdpAddr(s.to_string());

        let (ia, host) = s.split_once(',').ok_or_else(invalid)?;
        let ia: IsdAsn = ia.parse()?;

        let addr = match host.strip_prefix('[') {
            Some(bracketed) => {
                let (ip, port) = bracketed.rsplit_once("]:").ok_or_else(invalid)?;
                let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
                let port: u16 = port.parse().map_err(|_| invalid())?;
                SocketAddr::new(ip, port)
            }
            None => host.parse().map_err(|_| invalid())?,
        };

        Ok(Self { ia, addr })
    }
}

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::DecodeError;

/// ATYP — address type of the following address.
/// IP V4 address: 0x01
/// DOMAINNAME: 0x03
/// IP V6 address: 0x04
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressType {
    IPv4 = 0x01,
    Domain = 0x03,
    IPv6 = 0x04,
}

impl TryFrom<u8> for AddressType {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x01 => Ok(AddressType::IPv4),
            0x03 => Ok(AddressType::Domain),
            0x04 => Ok(AddressType::IPv6),
            val => Err(DecodeError::BadAtyp(val)),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(addr_type: AddressType) -> Self {
        match addr_type {
            AddressType::IPv4 => 0x01,
            AddressType::Domain => 0x03,
            AddressType::IPv6 => 0x04,
        }
    }
}

/// The decoded DST.ADDR field of a SOCKS5 request, before any DNS
/// resolution is attempted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DestAddr {
    Ip(std::net::IpAddr),
    Domain(String),
}

impl DestAddr {
    pub fn address_type(&self) -> AddressType {
        match self {
            DestAddr::Ip(std::net::IpAddr::V4(_)) => AddressType::IPv4,
            DestAddr::Ip(std::net::IpAddr::V6(_)) => AddressType::IPv6,
            DestAddr::Domain(_) => AddressType::Domain,
        }
    }
}

impl From<Ipv4Addr> for DestAddr {
    fn from(ip: Ipv4Addr) -> Self {
        DestAddr::Ip(std::net::IpAddr::V4(ip))
    }
}

impl From<Ipv6Addr> for DestAddr {
    fn from(ip: Ipv6Addr) -> Self {
        DestAddr::Ip(std::net::IpAddr::V6(ip))
    }
}

use std::net::SocketAddr;

use super::address::AddressType;

/// REP field of the SOCKS5 reply message.
///
/// 0x00 succeeded
/// 0x01 general SOCKS server failure
/// 0x02 connection not allowed by ruleset
/// 0x03 network unreachable
/// 0x04 host unreachable
/// 0x05 connection refused
/// 0x06 TTL expired
/// 0x07 command not supported
/// 0x08 address type not supported
/// 0x09-0xFF unassigned
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Reply {
    Succeeded = 0x00,
    Failure = 0x01,
    NotAllowed = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    TTLExpired = 0x06,
    UnsupportedCommand = 0x07,
    UnsupportedAddress = 0x08,
    Unassigned(u8),
}

impl From<u8> for Reply {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Succeeded,
            0x01 => Self::Failure,
            0x02 => Self::NotAllowed,
            0x03 => Self::NetworkUnreachable,
            0x04 => Self::HostUnreachable,
            0x05 => Self::ConnectionRefused,
            0x06 => Self::TTLExpired,
            0x07 => Self::UnsupportedCommand,
            0x08 => Self::UnsupportedAddress,
            val => Self::Unassigned(val),
        }
    }
}

impl From<Reply> for u8 {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Succeeded => 0x00,
            Reply::Failure => 0x01,
            Reply::NotAllowed => 0x02,
            Reply::NetworkUnreachable => 0x03,
            Reply::HostUnreachable => 0x04,
            Reply::ConnectionRefused => 0x05,
            Reply::TTLExpired => 0x06,
            Reply::UnsupportedCommand => 0x07,
            Reply::UnsupportedAddress => 0x08,
            Reply::Unassigned(val) => val,
        }
    }
}

/// Encodes a success or failure reply carrying a concrete bound address:
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  |   1   |  1   | 4 or 16  |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn encode(rep: Reply, bound: SocketAddr) -> Vec<u8> {
    let (atyp, ip_bytes): (AddressType, Vec<u8>) = match bound {
        SocketAddr::V4(addr) => (AddressType::IPv4, addr.ip().octets().to_vec()),
        SocketAddr::V6(addr) => (AddressType::IPv6, addr.ip().octets().to_vec()),
    };

    let mut buf = Vec::with_capacity(6 + ip_bytes.len());
    buf.push(0x05);
    buf.push(rep.into());
    buf.push(0x00);
    buf.push(atyp.into());
    buf.extend_from_slice(&ip_bytes);
    buf.extend_from_slice(&bound.port().to_be_bytes());
    buf
}

/// Encodes an error reply with no meaningful bound address, per RFC 1928:
/// ATYP=IPv4 with an all-zero BND.ADDR/BND.PORT is acceptable here.
pub fn encode_error(rep: Reply) -> Vec<u8> {
    vec![0x05, rep.into(), 0x00, AddressType::IPv4.into(), 0, 0, 0, 0, 0, 0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn encodes_ipv4_success_reply() {
        let bound = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 8789));
        let bytes = encode(Reply::Succeeded, bound);
        assert_eq!(
            bytes,
            vec![0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x22, 0x45]
        );
    }

    #[test]
    fn error_reply_is_all_zero_ipv4() {
        let bytes = encode_error(Reply::ConnectionRefused);
        assert_eq!(bytes, vec![0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }
}

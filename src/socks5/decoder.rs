//! Pure, restartable parsers for the two SOCKS5 handshake messages.
//!
//! Both entry points are plain functions over `(accumulated bytes) -> result`.
//! They never own a buffer themselves — the caller (the session's read loop)
//! accumulates bytes from the wire into a `Vec<u8>`, re-parses the whole
//! slice on every new read, and on `Finish` keeps whatever trailing bytes
//! were not consumed (there may be none, or there may be the start of the
//! next message if the client pipelined its writes). This makes the parser
//! trivially restart-safe: the result only depends on the concatenation of
//! bytes seen so far, never on how it was chopped into reads.

use std::net::Ipv4Addr;

use crate::error::DecodeError;

use super::address::DestAddr;
use super::command::Command;

const VERSION: u8 = 0x05;

/// Outcome of feeding a byte slice to one of the parsers below.
#[derive(Debug)]
pub enum Parsed<T> {
    /// Not enough bytes yet; call again after more bytes have arrived,
    /// passing the full accumulated slice (old bytes + new bytes).
    NeedMore,
    /// A complete message was parsed. `consumed` is the number of bytes
    /// (from the front of the slice that was passed in) that belong to
    /// this message; any bytes after that belong to a later message.
    Finish { value: T, consumed: usize },
}

/// Parsed greeting: `VER | NMETHODS | METHODS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub methods: Vec<u8>,
}

impl Greeting {
    pub fn offers_no_auth(&self) -> bool {
        self.methods.contains(&0x00)
    }
}

/// Parses the client's method-identification greeting.
///
/// `VER=0x05`, `NMETHODS` (1 byte, must be >= 1), then `NMETHODS` method
/// bytes. Restart-safe: splitting the input at any offset and feeding the
/// pieces through successive calls yields the same final result as one call
/// with the whole buffer.
pub fn parse_method_identification(bytes: &[u8]) -> Result<Parsed<Greeting>, DecodeError> {
    if bytes.is_empty() {
        return Ok(Parsed::NeedMore);
    }

    let version = bytes[0];
    if version != VERSION {
        return Err(DecodeError::BadVersion(version));
    }

    if bytes.len() < 2 {
        return Ok(Parsed::NeedMore);
    }

    let nmethods = bytes[1];
    if nmethods == 0 {
        return Err(DecodeError::BadNMethods);
    }

    let total = 2 + nmethods as usize;
    if bytes.len() < total {
        return Ok(Parsed::NeedMore);
    }

    let methods = bytes[2..total].to_vec();
    Ok(Parsed::Finish {
        value: Greeting { methods },
        consumed: total,
    })
}

/// Parsed request: `VER | CMD | RSV | ATYP | DST.ADDR | DST.PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub dst_addr: DestAddr,
    pub dst_port: u16,
}

/// Parses a CONNECT request. `VER=0x05`, `CMD`, `RSV=0x00`, `ATYP`, then an
/// address whose length depends on `ATYP` (4 bytes IPv4, 16 bytes IPv6, or a
/// 1-byte length prefix plus that many bytes for a domain name), then a
/// 2-byte big-endian port. Restart-safe for the same reason as above.
pub fn parse_request(bytes: &[u8]) -> Result<Parsed<Request>, DecodeError> {
    if bytes.len() < 4 {
        return Ok(Parsed::NeedMore);
    }

    let version = bytes[0];
    if version != VERSION {
        return Err(DecodeError::BadVersion(version));
    }

    let cmd = bytes[1];
    if Command::try_from(cmd)? != Command::Connect {
        return Err(DecodeError::UnsupportedCmd(cmd));
    }

    let rsv = bytes[2];
    if rsv != 0x00 {
        return Err(DecodeError::BadReserved(rsv));
    }

    let atyp = bytes[3];

    match atyp {
        0x01 => {
            let total = 4 + 4 + 2;
            if bytes.len() < total {
                return Ok(Parsed::NeedMore);
            }
            let ip = Ipv4Addr::new(bytes[4], bytes[5], bytes[6], bytes[7]);
            let port = u16::from_be_bytes([bytes[8], bytes[9]]);
            Ok(Parsed::Finish {
                value: Request {
                    dst_addr: ip.into(),
                    dst_port: port,
                },
                consumed: total,
            })
        }
        0x04 => {
            let total = 4 + 16 + 2;
            if bytes.len() < total {
                return Ok(Parsed::NeedMore);
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&bytes[4..20]);
            let ip = std::net::Ipv6Addr::from(octets);
            let port = u16::from_be_bytes([bytes[20], bytes[21]]);
            Ok(Parsed::Finish {
                value: Request {
                    dst_addr: ip.into(),
                    dst_port: port,
                },
                consumed: total,
            })
        }
        0x03 => {
            if bytes.len() < 5 {
                return Ok(Parsed::NeedMore);
            }
            let len = bytes[4] as usize;
            let total = 5 + len + 2;
            if bytes.len() < total {
                return Ok(Parsed::NeedMore);
            }
            let domain = String::from_utf8_lossy(&bytes[5..5 + len]).into_owned();
            let port = u16::from_be_bytes([bytes[5 + len], bytes[6 + len]]);
            Ok(Parsed::Finish {
                value: Request {
                    dst_addr: DestAddr::Domain(domain),
                    dst_port: port,
                },
                consumed: total,
            })
        }
        other => Err(DecodeError::BadAtyp(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_greeting(bytes: &[u8]) -> Greeting {
        match parse_method_identification(bytes).unwrap() {
            Parsed::Finish { value, .. } => value,
            Parsed::NeedMore => panic!("expected Finish, got NeedMore"),
        }
    }

    #[test]
    fn parses_complete_greeting_in_one_call() {
        let greeting = finish_greeting(&[0x05, 0x01, 0x00]);
        assert_eq!(greeting.methods, vec![0x00]);
        assert!(greeting.offers_no_auth());
    }

    #[test]
    fn rejects_gssapi_only_greeting_as_no_auth() {
        let greeting = finish_greeting(&[0x05, 0x01, 0x01]);
        assert!(!greeting.offers_no_auth());
    }

    #[test]
    fn bad_version_is_rejected_immediately() {
        let err = parse_method_identification(&[0x04, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::BadVersion(0x04)));
    }

    #[test]
    fn zero_nmethods_is_rejected() {
        let err = parse_method_identification(&[0x05, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::BadNMethods));
    }

    #[test]
    fn greeting_restart_safe_across_every_split_offset() {
        let whole: &[u8] = &[0x05, 0x03, 0x00, 0x02, 0x01];
        let reference = finish_greeting(whole);

        for split in 0..=whole.len() {
            let mut buf = Vec::new();
            let mut result = None;
            for chunk in [&whole[..split], &whole[split..]] {
                buf.extend_from_slice(chunk);
                match parse_method_identification(&buf).unwrap() {
                    Parsed::NeedMore => continue,
                    Parsed::Finish { value, consumed } => {
                        result = Some((value, consumed));
                        break;
                    }
                }
            }
            let (value, consumed) = result.expect("should finish once all bytes arrive");
            assert_eq!(value, reference, "split at {split}");
            assert_eq!(consumed, whole.len());
        }
    }

    #[test]
    fn parses_ipv4_request() {
        let bytes = [0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x23, 0x28];
        match parse_request(&bytes).unwrap() {
            Parsed::Finish { value, consumed } => {
                assert_eq!(consumed, bytes.len());
                assert_eq!(value.dst_port, 0x2328);
                assert_eq!(
                    value.dst_addr,
                    DestAddr::from(Ipv4Addr::new(127, 0, 0, 1))
                );
            }
            Parsed::NeedMore => panic!("expected Finish"),
        }
    }

    #[test]
    fn parses_domain_request() {
        let domain = b"bad.invalid";
        let mut bytes = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
        bytes.extend_from_slice(domain);
        bytes.extend_from_slice(&0x0050u16.to_be_bytes());

        match parse_request(&bytes).unwrap() {
            Parsed::Finish { value, consumed } => {
                assert_eq!(consumed, bytes.len());
                assert_eq!(value.dst_addr, DestAddr::Domain("bad.invalid".to_string()));
                assert_eq!(value.dst_port, 0x0050);
            }
            Parsed::NeedMore => panic!("expected Finish"),
        }
    }

    #[test]
    fn request_restart_safe_across_every_split_offset() {
        let domain = b"example.com";
        let mut whole = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
        whole.extend_from_slice(domain);
        whole.extend_from_slice(&80u16.to_be_bytes());

        let reference = match parse_request(&whole).unwrap() {
            Parsed::Finish { value, .. } => value,
            Parsed::NeedMore => panic!("expected Finish"),
        };

        for split in 0..=whole.len() {
            let mut buf = Vec::new();
            let mut result = None;
            for chunk in [&whole[..split], &whole[split..]] {
                buf.extend_from_slice(chunk);
                match parse_request(&buf).unwrap() {
                    Parsed::NeedMore => continue,
                    Parsed::Finish { value, consumed } => {
                        result = Some((value, consumed));
                        break;
                    }
                }
            }
            let (value, consumed) = result.expect("should finish once all bytes arrive");
            assert_eq!(value, reference, "split at {split}");
            assert_eq!(consumed, whole.len());
        }
    }

    #[test]
    fn rejects_bind_command() {
        let bytes = [0x05, 0x02, 0x00, 0x01, 127, 0, 0, 1, 0, 80];
        let err = parse_request(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedCmd(0x02)));
    }

    #[test]
    fn rejects_bad_reserved_byte() {
        let bytes = [0x05, 0x01, 0x01, 0x01, 127, 0, 0, 1, 0, 80];
        let err = parse_request(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::BadReserved(0x01)));
    }

    #[test]
    fn rejects_bad_atyp() {
        let bytes = [0x05, 0x01, 0x00, 0x02, 127, 0, 0, 1, 0, 80];
        let err = parse_request(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::BadAtyp(0x02)));
    }
}

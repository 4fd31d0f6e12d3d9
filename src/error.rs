use std::io;

use crate::socks5::reply::Reply;

/// Errors raised by the SOCKS5 handshake decoder.
///
/// These are pure parsing errors: they never touch I/O and are produced
/// by [`crate::socks5::decoder`] from an in-memory byte slice.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported SOCKS version {0:#04x}")]
    BadVersion(u8),

    #[error("NMETHODS must be at least 1")]
    BadNMethods,

    #[error("reserved byte must be 0x00, got {0:#04x}")]
    BadReserved(u8),

    #[error("unsupported command {0:#04x}")]
    UnsupportedCmd(u8),

    #[error("unsupported address type {0:#04x}")]
    BadAtyp(u8),
}

/// Crate-wide error type threaded through session handling.
#[derive(Debug, thiserror::Error)]
pub enum SocksError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("client offered no acceptable authentication method")]
    AuthUnacceptable,

    #[error("DNS resolution failed: {0}")]
    Resolve(#[source] io::Error),

    #[error("upstream connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("no candidate address could be reached")]
    ConnectExhausted,
}

impl SocksError {
    /// Maps this error to the SOCKS5 REP code to send back to the client,
    /// per RFC 1928 section 6 and this server's error-code table.
    pub fn reply_code(&self) -> Reply {
        match self {
            SocksError::Decode(DecodeError::UnsupportedCmd(_)) => Reply::UnsupportedCommand,
            SocksError::Decode(DecodeError::BadAtyp(_)) => Reply::UnsupportedAddress,
            SocksError::Decode(_) => Reply::Failure,
            SocksError::Connect(err) | SocksError::Resolve(err) => net_err_reply(err),
            SocksError::AuthUnacceptable => Reply::Failure,
            SocksError::ConnectExhausted => Reply::Failure,
            SocksError::Io(_) => Reply::Failure,
        }
    }
}

fn net_err_reply(err: &io::Error) -> Reply {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => Reply::ConnectionRefused,
        io::ErrorKind::NetworkUnreachable => Reply::NetworkUnreachable,
        io::ErrorKind::HostUnreachable => Reply::HostUnreachable,
        _ => Reply::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_cmd_maps_to_rep_7() {
        let err = SocksError::Decode(DecodeError::UnsupportedCmd(0x02));
        assert_eq!(err.reply_code(), Reply::UnsupportedCommand);
    }

    #[test]
    fn bad_atyp_maps_to_rep_8() {
        let err = SocksError::Decode(DecodeError::BadAtyp(0x09));
        assert_eq!(err.reply_code(), Reply::UnsupportedAddress);
    }

    #[test]
    fn connection_refused_maps_to_rep_5() {
        let io_err = io::Error::from(io::ErrorKind::ConnectionRefused);
        let err = SocksError::Connect(io_err);
        assert_eq!(err.reply_code(), Reply::ConnectionRefused);
    }

    #[test]
    fn other_io_error_maps_to_general_failure() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err = SocksError::Connect(io_err);
        assert_eq!(err.reply_code(), Reply::Failure);
    }
}

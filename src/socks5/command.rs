use crate::error::DecodeError;

/// SOCKS5 request command. Only CONNECT is implemented by this server;
/// BIND and UDP ASSOCIATE are recognized on the wire only so the decoder
/// can distinguish "not CONNECT" from "garbage byte".
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Command {
    Connect = 0x01,
    Bind = 0x02,
    Associate = 0x03,
}

impl TryFrom<u8> for Command {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Connect),
            0x02 => Ok(Self::Bind),
            0x03 => Ok(Self::Associate),
            val => Err(DecodeError::UnsupportedCmd(val)),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        match command {
            Command::Connect => 0x01,
            Command::Bind => 0x02,
            Command::Associate => 0x03,
        }
    }
}

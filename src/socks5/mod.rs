//! SOCKS5 (RFC 1928) wire types and handshake decoder.
//!
//! This module is pure: no I/O, no tokio. [`crate::session`] drives these
//! functions from its read loop and owns all actual socket traffic.

pub mod address;
pub mod command;
pub mod decoder;
pub mod method;
pub mod reply;

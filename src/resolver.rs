//! Asynchronous hostname resolution for Domain-ATYP CONNECT requests.

use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::error::SocksError;

/// Resolves `domain:port` to an ordered list of candidate addresses
/// (mixed v4/v6, in whatever order the system resolver returns them).
///
/// Backed by `tokio::net::lookup_host`, which dispatches to Tokio's
/// blocking-pool thread internally and therefore never blocks the calling
/// task's executor thread.
pub async fn resolve(domain: &str, port: u16) -> Result<Vec<SocketAddr>, SocksError> {
    let addrs = lookup_host((domain, port))
        .await
        .map_err(SocksError::Resolve)?
        .collect::<Vec<_>>();

    if addrs.is_empty() {
        return Err(SocksError::Resolve(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses found for {domain}"),
        )));
    }

    Ok(addrs)
}

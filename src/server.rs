//! Listener / acceptor and the process-lifetime `ServerContext`.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{lookup_host, TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::session::Session;

/// Read-only, process-lifetime state shared by every session: the bound
/// local address and configured port used to fill BND.ADDR/BND.PORT in
/// successful CONNECT replies.
#[derive(Debug, Clone, Copy)]
pub struct ServerContext {
    pub local_addr: SocketAddr,
}

/// Binds the configured host:port, trying each resolved candidate address
/// in turn until one accepts both `bind` and `listen`. Returns the bound
/// listener and the context sessions will read their reply address from.
pub async fn bind(cfg: &ServerConfig) -> io::Result<(TcpListener, ServerContext)> {
    let candidates: Vec<SocketAddr> = lookup_host((cfg.host.as_str(), cfg.port))
        .await?
        .collect();

    let mut last_err = None;
    for addr in candidates {
        match try_bind(addr, cfg.backlog).await {
            Ok(listener) => {
                let local_addr = listener.local_addr()?;
                tracing::info!(%local_addr, "server listening");
                return Ok((listener, ServerContext { local_addr }));
            }
            Err(err) => {
                tracing::warn!(%addr, backlog = cfg.backlog, error = %err, "bind/listen failed");
                last_err = Some(err);
            }
        }
    }

    let err = last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate addresses")
    });
    tracing::error!(host = %cfg.host, port = cfg.port, error = %err, "failed to bind on any candidate address");
    Err(err)
}

async fn try_bind(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => tokio::net::TcpSocket::new_v4()?,
        SocketAddr::V6(_) => tokio::net::TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}

/// Accepts connections in a loop, spawning one session task per accepted
/// client. Accept errors are logged and never tear down the loop.
pub async fn run(listener: TcpListener, ctx: ServerContext, cfg: Arc<ServerConfig>) -> ! {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                tracing::debug!(%peer_addr, "accepted connection");
                if let Err(err) = configure_keepalive(&stream, cfg.keepalive_secs) {
                    tracing::warn!(%peer_addr, error = %err, "failed to set keepalive, closing");
                    continue;
                }

                let cfg = Arc::clone(&cfg);
                tokio::spawn(async move {
                    let session = Session::new(stream, ctx, cfg);
                    if let Err(err) = session.run().await {
                        tracing::debug!(%peer_addr, error = %err, "session ended with error");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "accept failed");
            }
        }
    }
}

/// Enables TCP keepalive with the given idle time on `stream`. Shared by
/// the accept loop (client sockets) and the session's upstream connect
/// path (§6: "Keepalive enabled (60 s idle) on both client and upstream
/// sockets").
pub(crate) fn configure_keepalive(stream: &TcpStream, idle_secs: u64) -> io::Result<()> {
    let sock_ref = socket2::SockRef::from(stream);
    let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(idle_secs));
    sock_ref.set_tcp_keepalive(&keepalive)
}

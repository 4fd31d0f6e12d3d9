//! The per-connection SOCKS5 session state machine.
//!
//! One [`Session`] owns one client endpoint and, once connected, one
//! upstream endpoint. It is driven end-to-end by a single `tokio::spawn`ed
//! task (see [`crate::server::run`]): the task's own control flow *is* the
//! phase machine, and the task returning frees the session exactly once —
//! there is no separate close-latch bookkeeping to get wrong, because no
//! other task ever holds a reference to this session's sockets.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::ServerConfig;
use crate::error::SocksError;
use crate::resolver;
use crate::server::ServerContext;
use crate::socks5::address::DestAddr;
use crate::socks5::decoder::{self, Parsed};
use crate::socks5::method::Method;
use crate::socks5::reply::{self, Reply};

/// High-level phase of a session. Transitions are monotonic forward;
/// `Ending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    MethodNegotiation,
    Request,
    Streaming,
    Ending,
}

pub struct Session {
    client: TcpStream,
    ctx: ServerContext,
    cfg: Arc<ServerConfig>,
    phase: Phase,
}

impl Session {
    pub fn new(client: TcpStream, ctx: ServerContext, cfg: Arc<ServerConfig>) -> Self {
        Self {
            client,
            ctx,
            cfg,
            phase: Phase::MethodNegotiation,
        }
    }

    /// Drives the session to completion: greeting, request, and (on
    /// success) streaming. Always returns once both endpoints are closed.
    pub async fn run(mut self) -> Result<(), SocksError> {
        let (greeting, leftover) = match self.read_greeting().await {
            Ok(result) => result,
            Err(err) => {
                // Decoder errors during method negotiation close without a reply.
                self.phase = Phase::Ending;
                let _ = self.client.shutdown().await;
                return Err(err);
            }
        };

        if !greeting.offers_no_auth() {
            self.phase = Phase::Ending;
            let _ = self
                .client
                .write_all(&[0x05, Method::Unacceptable.into()])
                .await;
            let _ = self.client.shutdown().await;
            return Err(SocksError::AuthUnacceptable);
        }

        self.client
            .write_all(&[0x05, Method::None.into()])
            .await?;
        self.phase = Phase::Request;

        let (request, leftover) = match self.read_request(leftover).await {
            Ok(result) => result,
            Err(err) => {
                self.phase = Phase::Ending;
                let _ = self
                    .client
                    .write_all(&reply::encode_error(err.reply_code()))
                    .await;
                let _ = self.client.shutdown().await;
                return Err(err);
            }
        };

        let upstream = match self.connect_upstream(&request.dst_addr, request.dst_port).await {
            Ok(upstream) => upstream,
            Err(err) => {
                self.phase = Phase::Ending;
                let _ = self
                    .client
                    .write_all(&reply::encode_error(err.reply_code()))
                    .await;
                let _ = self.client.shutdown().await;
                return Err(err);
            }
        };

        self.client
            .write_all(&reply::encode(Reply::Succeeded, self.ctx.local_addr))
            .await?;
        self.phase = Phase::Streaming;

        let result = self.stream(upstream, leftover).await;
        self.phase = Phase::Ending;
        result
    }

    /// Reads and accumulates bytes until [`decoder::parse_method_identification`]
    /// produces `Finish` or an error. Restart-safe by construction: the
    /// decoder only ever sees the full accumulated slice. Returns any bytes
    /// read past the greeting (e.g. a pipelined request) so the caller can
    /// seed the next parse with them instead of dropping them.
    async fn read_greeting(&mut self) -> Result<(decoder::Greeting, Vec<u8>), SocksError> {
        let mut buf = Vec::new();
        loop {
            match decoder::parse_method_identification(&buf)? {
                Parsed::Finish { value, consumed } => {
                    let leftover = buf.split_off(consumed);
                    return Ok((value, leftover));
                }
                Parsed::NeedMore => self.read_more(&mut buf).await?,
            }
        }
    }

    /// Same contract as [`Self::read_greeting`], seeded with `seed` (bytes
    /// already received past the greeting) instead of starting from empty.
    async fn read_request(
        &mut self,
        seed: Vec<u8>,
    ) -> Result<(decoder::Request, Vec<u8>), SocksError> {
        let mut buf = seed;
        loop {
            match decoder::parse_request(&buf)? {
                Parsed::Finish { value, consumed } => {
                    let leftover = buf.split_off(consumed);
                    return Ok((value, leftover));
                }
                Parsed::NeedMore => self.read_more(&mut buf).await?,
            }
        }
    }

    /// Reads one chunk from the client into `buf`. `Ok(0)` here is an
    /// authoritative EOF under Tokio's readiness-driven I/O, so a client
    /// that disconnects mid-handshake (before a full message has
    /// accumulated) is treated as an error rather than retried.
    async fn read_more(&mut self, buf: &mut Vec<u8>) -> Result<(), SocksError> {
        let mut chunk = [0u8; 512];
        let n = self.client.read(&mut chunk).await?;
        if n == 0 {
            return Err(SocksError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "client closed connection during handshake",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }

    /// Resolves (if needed) and connects to the requested destination.
    /// For IPv4/IPv6 ATYP a single connect attempt is made; for Domain
    /// ATYP, candidates are tried in resolver order and the first
    /// successful connect wins.
    async fn connect_upstream(
        &self,
        dst: &DestAddr,
        port: u16,
    ) -> Result<TcpStream, SocksError> {
        let candidates: Vec<SocketAddr> = match dst {
            DestAddr::Ip(ip) => vec![SocketAddr::new(*ip, port)],
            DestAddr::Domain(domain) => resolver::resolve(domain, port).await?,
        };

        let mut last_err = None;
        for addr in candidates {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    if let Err(err) = crate::server::configure_keepalive(
                        &stream,
                        self.cfg.keepalive_secs,
                    ) {
                        tracing::warn!(%addr, error = %err, "failed to set upstream keepalive");
                    }
                    tracing::info!(%addr, "connected to upstream");
                    return Ok(stream);
                }
                Err(err) => {
                    tracing::warn!(%addr, error = %err, "upstream connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(SocksError::Connect(err)),
            None => Err(SocksError::ConnectExhausted),
        }
    }

    /// Bidirectional relay: two independent stop-and-wait pumps, one per
    /// direction, each bounded to a single buffer of `cfg.buffer_size`
    /// bytes. Each pump's sequential read-then-write-then-loop structure
    /// naturally pauses reads on a side while its buffer's write is in
    /// flight and resumes them once the write completes, without needing
    /// explicit pause/resume flags.
    ///
    /// `leftover` is any client bytes already read past the CONNECT request
    /// (the client pipelined its first payload bytes instead of waiting for
    /// the reply) and is flushed to the upstream before either pump starts.
    async fn stream(&mut self, upstream: TcpStream, leftover: Vec<u8>) -> Result<(), SocksError> {
        let (mut client_rd, mut client_wr) = self.client.split();
        let (mut upstream_rd, mut upstream_wr) = tokio::io::split(upstream);

        if !leftover.is_empty() {
            upstream_wr.write_all(&leftover).await?;
        }

        let buffer_size = self.cfg.buffer_size;
        let client_to_upstream = pump(&mut client_rd, &mut upstream_wr, buffer_size);
        let upstream_to_client = pump(&mut upstream_rd, &mut client_wr, buffer_size);

        let result = tokio::select! {
            res = client_to_upstream => res,
            res = upstream_to_client => res,
        };

        // Entering `Ending` means closing both endpoints; shut down both
        // halves explicitly rather than relying on the eventual `Drop` of
        // the underlying sockets once the halves and streams go out of
        // scope.
        let _ = client_wr.shutdown().await;
        let _ = upstream_wr.shutdown().await;

        result
    }
}

/// Relays `src -> dst` until EOF or error. A single owned buffer is reused
/// for every iteration, bounding this pump's memory to `buffer_size`
/// regardless of total bytes relayed.
async fn pump<R, W>(src: &mut R, dst: &mut W, buffer_size: usize) -> Result<(), SocksError>
where
    R: AsyncReadExt + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        dst.write_all(&buf[..n]).await?;
    }
}

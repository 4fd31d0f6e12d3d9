use clap::Parser;

/// Configuration for the SOCKS5 proxy server.
///
/// Out of scope for the core session state machine (see the crate's design
/// notes); this is the ambient configuration surface the binary uses to
/// build a [`crate::server::ServerContext`] before starting the listener.
#[derive(Debug, Clone, Parser)]
#[command(name = "rusocks-server", about = "A SOCKS5 CONNECT-only TCP proxy")]
pub struct ServerConfig {
    /// Host to bind the listening socket on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the listening socket on.
    #[arg(long, default_value_t = 8789)]
    pub port: u16,

    /// TCP listen backlog.
    #[arg(long, default_value_t = 256)]
    pub backlog: u32,

    /// Size in bytes of each direction's relay buffer.
    #[arg(long, default_value_t = 2048)]
    pub buffer_size: usize,

    /// TCP keepalive idle time, in seconds, for client and upstream sockets.
    #[arg(long, default_value_t = 60)]
    pub keepalive_secs: u64,

    /// Increase log verbosity; may be repeated (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8789,
            backlog: 256,
            buffer_size: 2048,
            keepalive_secs: 60,
            verbose: 0,
        }
    }
}

impl ServerConfig {
    /// Translates `-v` occurrences into a `tracing` level filter, matching
    /// the default quiet level used when the flag is absent.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

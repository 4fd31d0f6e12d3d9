use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rusocks::config::ServerConfig;
use rusocks::server;

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(cfg.log_level())
        .init();

    let (listener, ctx) = match server::bind(&cfg).await {
        Ok(bound) => bound,
        Err(err) => {
            tracing::error!(error = %err, "fatal: could not bind listener");
            return ExitCode::FAILURE;
        }
    };

    server::run(listener, ctx, Arc::new(cfg)).await;
}

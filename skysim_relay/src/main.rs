// skysim_relay/src/main.rs

mod protocol;
mod server;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Telemetry relay for SKYSIM front ends.
///
/// Pushes a command from the fixed table to every connected client on a
/// fixed interval and logs inbound telemetry, status, obstacle and
/// natural-language messages. Messages are newline-delimited JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8765")]
    bind: String,

    /// Seconds between pushed commands.
    #[arg(long, default_value_t = 2.0)]
    command_interval: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let listener = TcpListener::bind(&args.bind).await?;
    server::serve(listener, Duration::from_secs_f64(args.command_interval)).await?;
    Ok(())
}

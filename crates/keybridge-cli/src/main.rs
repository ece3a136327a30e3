//! Keybridge proxy launcher.
//!
//! Parses the connection options, initializes logging, and runs the
//! supervisor until the session limit is reached or a shutdown signal
//! arrives. Startup misconfiguration exits non-zero; per-session
//! failures never end the process.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use keybridge_core::{ProxyConfig, Supervisor};

/// Relay proxy bridging an authenticated ECDHE channel to a verified
/// TLS key server.
#[derive(Parser)]
#[command(name = "keybridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TCP port to listen on for inbound ECDHE connections
    #[arg(short = 'p', long)]
    local_port: u16,

    /// PEM file: the proxy's long-term signing private key
    #[arg(short = 'r', long)]
    private: PathBuf,

    /// PEM file: the peer's long-term public verification key or
    /// certificate
    #[arg(short = 'u', long)]
    public: PathBuf,

    /// Hostname or IP address of the remote TLS key server
    #[arg(short = 'I', long)]
    remote_ip: String,

    /// Port of the remote TLS key server
    #[arg(short = 'P', long)]
    remote_port: u16,

    /// Trust-anchor bundle used to verify the remote server (default:
    /// the built-in root set)
    #[arg(short = 'C', long)]
    ca_path: Option<PathBuf>,

    /// Client TLS private key, for servers requiring mutual TLS
    #[arg(short = 'R', long)]
    client_key: Option<PathBuf>,

    /// Client TLS certificate, for servers requiring mutual TLS
    #[arg(short = 'U', long)]
    client_cert: Option<PathBuf>,

    /// Number of sessions to serve before exiting (zero or negative:
    /// unlimited)
    #[arg(short = 'm', long, default_value_t = 0)]
    maxconn: i64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output (implies --verbose)
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> ProxyConfig {
        ProxyConfig {
            local_port: self.local_port,
            private_key: self.private,
            peer_public: self.public,
            remote_host: self.remote_ip,
            remote_port: self.remote_port,
            ca_path: self.ca_path,
            client_key: self.client_key,
            client_cert: self.client_cert,
            maxconn: self.maxconn,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = cli.into_config();
    let supervisor = Supervisor::bind(&config)
        .await
        .context("startup failed")?;

    tokio::select! {
        () = supervisor.run() => {
            info!("supervisor finished");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutdown signal received");
        }
    }

    Ok(())
}

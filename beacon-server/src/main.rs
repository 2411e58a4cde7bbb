//! Beacon server daemon: announces itself on the multicast channel, answers pings, logs data.
//!
//! ```bash
//! beacon-server --host 239.255.0.1 --send-port 7776 --receive-port 7777
//! RUST_LOG=beacon_core=debug beacon-server --config ./beacon.toml
//! ```

mod config;
mod status;
mod transport;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use beacon_core::{BeaconServer, DataPacket, TrimPolicy};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::transport::UdpTransport;

/// Beacon server - LAN discovery and data broadcast over OSC
#[derive(Parser, Debug)]
#[command(name = "beacon-server", version, about)]
struct Args {
    /// Config file (default: ~/.config/beacon/config.toml, then /etc/beacon/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Multicast/send host
    #[arg(long)]
    host: Option<String>,
    /// Port clients listen on
    #[arg(long)]
    send_port: Option<u16>,
    /// Port to listen on
    #[arg(long)]
    receive_port: Option<u16>,
    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let mut cfg = config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(p) = args.send_port {
        cfg.server.send_port = p;
    }
    if let Some(p) = args.receive_port {
        cfg.server.receive_port = p;
    }
    if let Some(t) = args.tick_ms {
        cfg.tick_interval_ms = t;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %cfg.server,
        "beacon server starting"
    );

    let transport = UdpTransport::bind(&cfg.server).context("Failed to open UDP sockets")?;
    let sink = |from: &str, packet: DataPacket| {
        info!(
            host = %from,
            strings = ?packet.strings,
            ints = ?packet.ints,
            floats = ?packet.floats,
            "data received"
        );
    };
    let mut server = BeaconServer::init(cfg.server.clone(), transport, sink)
        .context("Failed to initialise server")?;
    server.set_hello_interval(cfg.hello_interval_ms);
    server.set_max_messages_per_tick(cfg.max_messages_per_tick);
    server.set_client_idle_timeout(cfg.client_idle_timeout_ms);
    if cfg.strict_recent_log {
        server.set_trim_policy(TrimPolicy::Strict);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    rt.block_on(run(&mut server, &cfg))?;

    info!("beacon server stopped");
    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "beacon_server=info,beacon_core=info";

/// `RUST_LOG` when set and valid, otherwise info for both crates.
fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Drive `advance` on a fixed cadence until a shutdown signal arrives.
async fn run<S: beacon_core::PacketSink>(
    server: &mut BeaconServer<UdpTransport, S>,
    cfg: &config::Config,
) -> Result<()> {
    let start = Instant::now();
    let mut tick = tokio::time::interval(Duration::from_millis(cfg.tick_interval_ms.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status_tick =
        tokio::time::interval(Duration::from_millis(cfg.status_interval_ms.max(1)));
    status_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_status = String::new();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                server.advance(now);
            }
            _ = status_tick.tick() => {
                let line = status::render(
                    server.endpoint(),
                    server.recent_subjects(),
                    server.clients().len(),
                );
                if line != last_status {
                    info!("{line}");
                    last_status = line;
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    error!(error = %e, "error waiting for shutdown signal");
                    return Err(e);
                }
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_defaults() {
        let filter = log_filter(Some("beacon_core=debug".into())).to_string();
        assert!(filter.contains("beacon_core=debug"));
        assert!(!filter.contains("beacon_core=info"));
        assert!(!filter.contains("beacon_server"));
    }

    #[test]
    fn unset_or_invalid_rust_log_uses_defaults() {
        for rust_log in [None, Some(String::new()), Some("beacon_core=loud".into())] {
            let filter = log_filter(rust_log).to_string();
            assert!(filter.contains("beacon_server=info"));
            assert!(filter.contains("beacon_core=info"));
        }
    }
}

//! Live CAN clock-fingerprint monitor.
//!
//! Usage: `sentinel-monitor [interface] [-c <path>]`
//!
//! Logs one line per classification record until Ctrl-C. Set `RUST_LOG` to
//! change verbosity (default `info`).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use sentinel::{MonitorConfig, Sentinel, Verdict};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sentinel-monitor", about = "Flag CAN frames that do not fit their sender's clock")]
struct Cli {
    /// SocketCAN interface to monitor (overrides the config file)
    interface: Option<String>,

    /// YAML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(interface) = cli.interface {
        config.interface = interface;
    }

    let mut session = match Sentinel::monitor(config.clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            for suggestion in e.recovery_suggestions() {
                info!("  - {suggestion}");
            }
            return Err(e).context(format!("starting monitor on {}", config.interface));
        }
    };

    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stopping monitor");
            cancel.cancel();
        }
    });

    info!(interface = %config.interface, "Monitoring started, press Ctrl-C to stop");

    {
        let mut records = session.records();
        while let Some(record) = records.next().await {
            match record.verdict {
                Verdict::Anomaly => warn!(
                    can_id = %record.id,
                    drift = record.drift,
                    residual_us = record.residual_us(),
                    "{record}"
                ),
                _ => info!("{record}"),
            }
        }
    }

    let report = session.stop().await.context("monitor stopped with an error")?;
    info!(
        frames = report.frames_received,
        records = report.records_emitted,
        untimestamped = report.skipped_untimestamped,
        out_of_order = report.skipped_out_of_order,
        identifiers = report.identifiers,
        "Monitor stopped ({})",
        report.stop_reason
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_and_config_are_optional() {
        let cli = Cli::try_parse_from(["sentinel-monitor"]).unwrap();
        assert!(cli.interface.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_interface_and_short_config() {
        let cli = Cli::try_parse_from(["sentinel-monitor", "vcan0", "-c", "sentinel.yaml"]).unwrap();
        assert_eq!(cli.interface.as_deref(), Some("vcan0"));
        assert_eq!(cli.config, Some(PathBuf::from("sentinel.yaml")));
    }

    #[test]
    fn rejects_unknown_flags_and_extra_interfaces() {
        assert!(Cli::try_parse_from(["sentinel-monitor", "--verbose"]).is_err());
        assert!(Cli::try_parse_from(["sentinel-monitor", "can0", "can1"]).is_err());
    }
}

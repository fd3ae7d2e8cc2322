//! netscout - network discovery and device classification
//!
//! Sweeps a range or the network attached to an interface, enriches every live
//! host and optionally exports the full scan as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use netscout::logging::{init_logging_with_config, LogConfig, LogFormat};
use netscout::net::interface;
use netscout::snapshot::write_snapshot;
use netscout::{NetworkDiscovery, ScanConfig, ScanMode};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{info, warn};

/// Network discovery and device classification
#[derive(Parser, Debug)]
#[command(name = "netscout")]
#[command(version)]
#[command(about = "Discover and classify devices on a local network", long_about = None)]
struct Args {
    /// CIDR (192.168.1.0/24), dash range (192.168.1.10-192.168.1.20), single
    /// address, or interface name
    target: Option<String>,

    /// Concurrent liveness probes
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Concurrent port probes per host
    #[arg(long)]
    port_jobs: Option<usize>,

    /// Hosts enriched concurrently
    #[arg(long)]
    host_jobs: Option<usize>,

    /// Liveness sweep only, no per-host enrichment
    #[arg(long)]
    quick: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export the scan as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    /// List local interfaces and their networks
    #[arg(long)]
    list: bool,
}

fn looks_like_range(target: &str) -> bool {
    target.contains('/')
        || target.parse::<IpAddr>().is_ok()
        || target
            .split_once('-')
            .is_some_and(|(start, _)| start.trim().parse::<IpAddr>().is_ok())
}

fn print_interfaces() -> Result<()> {
    let networks = interface::list_network_interfaces()?;
    if networks.is_empty() {
        println!("No IPv4 interfaces found");
    }
    for n in networks {
        println!("  {:<12} {:<16} {}", n.name, n.address, n.network);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging_with_config(LogConfig::new().level(&args.log_level).format(args.log_format));

    if args.list {
        return print_interfaces();
    }

    let Some(target) = args.target else {
        println!("Usage: netscout [OPTIONS] <CIDR|RANGE|INTERFACE>");
        println!();
        println!("Available interfaces:");
        print_interfaces()?;
        anyhow::bail!("no target network specified");
    };

    let range = if looks_like_range(&target) {
        target
    } else {
        interface::get_network_from_interface(&target)?
    };

    let config = match &args.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ScanConfig::default(),
    };
    let mut config = config.merge_env();
    if let Some(jobs) = args.jobs {
        config.set_liveness_workers(jobs);
    }
    if let Some(jobs) = args.host_jobs {
        config.set_host_workers(jobs);
    }
    if let Some(jobs) = args.port_jobs {
        config.set_port_workers(jobs);
    }

    info!("netscout {} starting", env!("CARGO_PKG_VERSION"));
    info!("Target network: {}", range);
    info!(
        "Concurrency: {} liveness, {} hosts x {} ports ({} connects in flight at most)",
        config.liveness_workers,
        config.host_workers,
        config.port_workers,
        config.max_in_flight_connects()
    );

    let discovery = NetworkDiscovery::new(config)?;
    let mode = if args.quick { ScanMode::LivenessOnly } else { ScanMode::Detailed };
    let mut devices = discovery.scan(&range, mode).await?;
    devices.sort_by_key(|d| d.address);

    if devices.is_empty() {
        warn!("No live hosts found in {}", range);
    }
    for device in &devices {
        let ports = device
            .open_ports()
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<16} {:<24} {:<15} {:<20} {:<18} {}",
            device.address,
            device.hostname_or_unknown(),
            device.device_type(),
            device.operating_system(),
            device.vendor(),
            ports
        );
    }

    let snapshot = discovery.export_snapshot().await;
    info!(
        "{} devices, {} open ports",
        snapshot.summary.total_devices, snapshot.summary.total_open_ports
    );
    for (device_type, count) in &snapshot.summary.device_type_counts {
        info!("  {}: {}", device_type, count);
    }

    if let Some(output) = args.output {
        let path = write_snapshot(&snapshot, output).await?;
        info!("Results written to {}", path.display());
    }

    Ok(())
}

//! Gateway detection and the derived node/edge graph

use crate::errors::{NetworkDiscoveryError, Result};
use crate::model::{Device, DeviceType};
use crate::net::ping::{probe_host, LivenessProbe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

pub const GATEWAY_NODE_ID: &str = "gateway";
const EDGE_KIND: &str = "ethernet";

/// OS default-route lookup
#[async_trait]
pub trait RouteTable: Send + Sync {
    async fn default_gateway(&self) -> Result<Option<IpAddr>>;
}

/// Reads `/proc/net/route`, falling back to `ip route show default`
pub struct SystemRouteTable {
    timeout: Duration,
}

impl SystemRouteTable {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn from_ip_command(&self) -> Result<Option<IpAddr>> {
        let output = timeout(self.timeout, Command::new("ip").args(["route", "show", "default"]).output())
            .await
            .map_err(|_| NetworkDiscoveryError::ResolutionFailure("ip route timed out".to_string()))??;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_ip_route(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl RouteTable for SystemRouteTable {
    async fn default_gateway(&self) -> Result<Option<IpAddr>> {
        match tokio::fs::read_to_string("/proc/net/route").await {
            Ok(table) => {
                if let Some(gw) = parse_proc_route(&table) {
                    return Ok(Some(gw));
                }
            }
            Err(e) => trace!("/proc/net/route unavailable: {}", e),
        }
        self.from_ip_command().await
    }
}

/// Default gateway from `/proc/net/route`. Addresses there are the raw
/// network-order bytes printed as a little-endian hex word.
pub fn parse_proc_route(table: &str) -> Option<IpAddr> {
    table
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|cols| cols.len() >= 3 && cols[1] == "00000000")
        .filter_map(|cols| u32::from_str_radix(cols[2], 16).ok())
        .map(|raw| Ipv4Addr::from(raw.to_le_bytes()))
        .find(|ip| !ip.is_unspecified())
        .map(IpAddr::V4)
}

/// Default gateway from `ip route show default` output (`default via <addr> ...`)
pub fn parse_ip_route(output: &str) -> Option<IpAddr> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens
            .by_ref()
            .skip_while(|t| *t != "via")
            .nth(1)
            .and_then(|addr| addr.parse::<IpAddr>().ok())
            .filter(|ip| !ip.is_unspecified())
    })
}

/// Route table first, then the first conventional address that answers a
/// liveness probe. `None` when everything fails.
pub async fn detect_gateway(
    routes: &dyn RouteTable,
    probe: &dyn LivenessProbe,
    candidates: &[IpAddr],
) -> Option<IpAddr> {
    match routes.default_gateway().await {
        Ok(Some(gateway)) => {
            debug!("Default route via {}", gateway);
            return Some(gateway);
        }
        Ok(None) => debug!("No default route found"),
        Err(e) => warn!(code = e.code(), "Default route lookup failed: {}", e),
    }

    for &candidate in candidates {
        if probe_host(probe, candidate).await.is_some() {
            debug!("Using conventional gateway {}", candidate);
            return Some(candidate);
        }
    }

    None
}

/// Display color for a device category
pub fn node_color(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::Router => "#FF6B6B",
        DeviceType::Server => "#4ECDC4",
        DeviceType::Printer => "#45B7D1",
        DeviceType::Nas => "#96CEB4",
        DeviceType::WindowsServer => "#FFEAA7",
        DeviceType::LinuxServer => "#DDA0DD",
        DeviceType::WebServer => "#98D8C8",
        DeviceType::Unknown => "#95A5A6",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: String,
    pub label: String,
    pub category: DeviceType,
    pub address: IpAddr,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
    pub generated_at: DateTime<Utc>,
    pub total_devices: usize,
}

/// Build the star topology around `gateway`.
///
/// One node per device plus a hub node when a gateway is known; each device
/// other than the gateway gets exactly one edge to the hub. Without a gateway
/// the graph has device nodes only.
pub fn synthesize<'a>(devices: impl IntoIterator<Item = &'a Device>, gateway: Option<IpAddr>) -> Topology {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    if let Some(gateway) = gateway {
        nodes.push(TopologyNode {
            id: GATEWAY_NODE_ID.to_string(),
            label: format!("Gateway\n{}", gateway),
            category: DeviceType::Router,
            address: gateway,
            color: node_color(DeviceType::Router).to_string(),
            port_count: None,
            services: None,
        });
    }

    for device in devices {
        let device_type = device.device_type();
        let id = device.address.to_string();

        nodes.push(TopologyNode {
            id: id.clone(),
            label: format!("{}\n{}\n({})", device.hostname_or_unknown(), device.address, device_type),
            category: device_type,
            address: device.address,
            color: node_color(device_type).to_string(),
            port_count: Some(device.open_port_count()),
            services: Some(device.services().into_values().collect()),
        });

        if matches!(gateway, Some(gw) if gw != device.address) {
            edges.push(TopologyEdge {
                from: id,
                to: GATEWAY_NODE_ID.to_string(),
                kind: EDGE_KIND.to_string(),
            });
        }
    }

    Topology {
        total_devices: nodes.len(),
        nodes,
        edges,
        generated_at: Utc::now(),
    }
}

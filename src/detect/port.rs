use crate::constants::SERVICE_NAMES;
use crate::errors::{NetworkDiscoveryError, Result};
use crate::model::ServiceScan;
use async_trait::async_trait;
use futures::pin_mut;
use futures::stream::{self, StreamExt};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Single-port connectivity check
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// `Ok(true)` only when a full handshake completed within the timeout
    async fn is_open(&self, ip: IpAddr, port: u16) -> Result<bool>;
}

/// TCP connect probe with a fixed timeout
pub struct TcpConnectPortProbe {
    timeout: Duration,
}

impl TcpConnectPortProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PortProbe for TcpConnectPortProbe {
    async fn is_open(&self, ip: IpAddr, port: u16) -> Result<bool> {
        match timeout(self.timeout, TcpStream::connect(SocketAddr::new(ip, port))).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => Ok(false),
            Ok(Err(e)) => Err(NetworkDiscoveryError::ProbeUnreachable {
                target: ip,
                reason: e.to_string(),
            }),
            Err(_) => Err(NetworkDiscoveryError::ProbeTimeout {
                target: ip,
                port: Some(port),
            }),
        }
    }
}

/// Label for a port from the static service table; unlisted ports get `Port-<n>`
pub fn service_label(port: u16) -> String {
    SERVICE_NAMES
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Port-{}", port))
}

/// Probe every port in `catalog` on one host, at most `workers` at a time.
///
/// Closed, filtered and timed-out ports are dropped. Nothing is returned until
/// the whole catalog has been probed, so callers never see a partial pass.
pub async fn enumerate_services(
    probe: &dyn PortProbe,
    ip: IpAddr,
    catalog: &[u16],
    workers: usize,
) -> ServiceScan {
    let port_stream = stream::iter(catalog.iter().copied())
        .map(|port| async move {
            match probe.is_open(ip, port).await {
                Ok(true) => Some(port),
                Ok(false) => None,
                Err(e) if e.is_probe_failure() => {
                    trace!(code = e.code(), "port probe {}:{} failed: {}", ip, port, e);
                    None
                }
                Err(e) => {
                    debug!(code = e.code(), "port probe {}:{} errored: {}", ip, port, e);
                    None
                }
            }
        })
        .buffer_unordered(workers.max(1));

    let mut scan = ServiceScan::default();
    pin_mut!(port_stream);
    while let Some(result) = port_stream.next().await {
        if let Some(port) = result {
            scan.open_ports.insert(port);
            scan.services.insert(port, service_label(port));
        }
    }

    debug!("{}: {} open ports of {} probed", ip, scan.open_ports.len(), catalog.len());
    scan
}

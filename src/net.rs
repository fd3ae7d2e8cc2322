use crate::config::{ProbeMethod, ScanConfig};
use crate::detect::hostname::HostResolver;
use crate::errors::{NetworkDiscoveryError, Result};
use crate::model::LiveHost;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, trace};

/// Address range parsing
pub mod range {
    use super::*;

    /// Expand a range descriptor into the addresses a sweep will probe.
    ///
    /// Accepts CIDR (`192.168.1.0/24`), a dash range (`10.0.0.1-10.0.0.20`) or a
    /// single IPv4 address. For prefixes shorter than /31 the network and
    /// broadcast addresses are skipped. Prefixes shorter than `min_prefix_len`
    /// are rejected so a typo cannot start a sweep over millions of hosts.
    pub fn parse_range(descriptor: &str, min_prefix_len: u8) -> Result<Vec<IpAddr>> {
        let descriptor = descriptor.trim();
        if descriptor.contains('/') {
            parse_cidr(descriptor, min_prefix_len)
        } else if descriptor.contains('-') {
            parse_ip_range(descriptor, min_prefix_len)
        } else {
            let ip = parse_v4(descriptor)?;
            Ok(vec![IpAddr::V4(ip)])
        }
    }

    fn parse_v4(s: &str) -> Result<Ipv4Addr> {
        s.trim()
            .parse()
            .map_err(|_| invalid(format!("Invalid IPv4 address: {}", s)))
    }

    fn invalid(msg: String) -> NetworkDiscoveryError {
        NetworkDiscoveryError::Configuration(msg)
    }

    fn max_hosts(min_prefix_len: u8) -> u64 {
        1u64 << (32 - u32::from(min_prefix_len.min(32)))
    }

    fn parse_cidr(cidr: &str, min_prefix_len: u8) -> Result<Vec<IpAddr>> {
        let (ip, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| invalid(format!("Invalid CIDR: {}", cidr)))?;
        let ip = parse_v4(ip)?;
        let prefix: u8 = prefix
            .trim()
            .parse()
            .map_err(|_| invalid(format!("Invalid prefix in CIDR: {}", cidr)))?;

        if prefix > 32 {
            return Err(invalid(format!("Invalid prefix length: {}", prefix)));
        }
        if prefix < min_prefix_len {
            return Err(invalid(format!(
                "CIDR prefix too small (minimum /{}): {}",
                min_prefix_len, cidr
            )));
        }

        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        let network = u32::from(ip) & mask;
        let broadcast = network | !mask;

        let (start, end) = if prefix < 31 {
            (network + 1, broadcast - 1)
        } else {
            (network, broadcast)
        };

        Ok((start..=end).map(|n| IpAddr::V4(Ipv4Addr::from(n))).collect())
    }

    fn parse_ip_range(range: &str, min_prefix_len: u8) -> Result<Vec<IpAddr>> {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| invalid(format!("Invalid IP range: {}", range)))?;
        let start = u32::from(parse_v4(start)?);
        let end = u32::from(parse_v4(end)?);

        if start > end {
            return Err(invalid(format!("Range start is after range end: {}", range)));
        }
        if u64::from(end - start) + 1 > max_hosts(min_prefix_len) {
            return Err(invalid(format!(
                "IP range too large (maximum {} hosts): {}",
                max_hosts(min_prefix_len),
                range
            )));
        }

        Ok((start..=end).map(|n| IpAddr::V4(Ipv4Addr::from(n))).collect())
    }
}

/// Host liveness probing and the bounded sweep over a range
pub mod ping {
    use super::*;

    /// Single-host reachability check
    #[async_trait]
    pub trait LivenessProbe: Send + Sync {
        /// Round-trip time when the host answered, `None` when it stayed silent
        async fn probe(&self, ip: IpAddr) -> Result<Option<Duration>>;

        fn name(&self) -> &'static str;
    }

    /// ICMP echo probe via `surge-ping`
    pub struct IcmpProbe {
        timeout: Duration,
    }

    impl IcmpProbe {
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }
    }

    #[async_trait]
    impl LivenessProbe for IcmpProbe {
        async fn probe(&self, ip: IpAddr) -> Result<Option<Duration>> {
            let payload = [0u8; 56];
            match timeout(self.timeout, surge_ping::ping(ip, &payload)).await {
                Ok(Ok((_packet, rtt))) => Ok(Some(rtt)),
                Ok(Err(e)) => Err(NetworkDiscoveryError::ProbeUnreachable {
                    target: ip,
                    reason: e.to_string(),
                }),
                Err(_) => Err(NetworkDiscoveryError::ProbeTimeout { target: ip, port: None }),
            }
        }

        fn name(&self) -> &'static str {
            "icmp echo"
        }
    }

    /// TCP connect probe. A completed handshake or an explicit refusal both prove
    /// the host is up; a timeout on every port means no answer.
    pub struct TcpConnectProbe {
        ports: Vec<u16>,
        timeout: Duration,
    }

    impl TcpConnectProbe {
        pub fn new(ports: Vec<u16>, timeout: Duration) -> Self {
            Self { ports, timeout }
        }
    }

    #[async_trait]
    impl LivenessProbe for TcpConnectProbe {
        async fn probe(&self, ip: IpAddr) -> Result<Option<Duration>> {
            let start = Instant::now();

            for &port in &self.ports {
                match timeout(self.timeout, TcpStream::connect(SocketAddr::new(ip, port))).await {
                    Ok(Ok(_stream)) => return Ok(Some(start.elapsed())),
                    Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                        return Ok(Some(start.elapsed()));
                    }
                    Ok(Err(e)) => trace!("TCP liveness {}:{} failed: {}", ip, port, e),
                    Err(_) => trace!("TCP liveness {}:{} timed out", ip, port),
                }
            }

            Ok(None)
        }

        fn name(&self) -> &'static str {
            "tcp connect"
        }
    }

    /// Build the liveness probe selected by the configuration
    pub fn probe_for(config: &ScanConfig) -> Arc<dyn LivenessProbe> {
        match config.probe_method {
            ProbeMethod::Icmp => Arc::new(IcmpProbe::new(config.liveness_timeout())),
            ProbeMethod::TcpConnect => Arc::new(TcpConnectProbe::new(
                config.liveness_tcp_ports.clone(),
                config.liveness_timeout(),
            )),
        }
    }

    /// Probe one address and report it as live only on a positive answer.
    /// Every failure is logged and swallowed.
    pub async fn probe_host(probe: &dyn LivenessProbe, ip: IpAddr) -> Option<Duration> {
        match probe.probe(ip).await {
            Ok(rtt) => rtt,
            Err(e) if e.is_probe_failure() => {
                trace!(code = e.code(), "liveness probe for {} failed: {}", ip, e);
                None
            }
            Err(e) => {
                debug!(code = e.code(), "liveness probe for {} errored: {}", ip, e);
                None
            }
        }
    }

    /// Probe every target with at most `workers` probes in flight.
    ///
    /// Reverse resolution runs only for addresses that answered; a failed lookup
    /// leaves the hostname empty. The returned order follows probe completion,
    /// not the input order.
    pub async fn parallel_ping_sweep(
        targets: Vec<IpAddr>,
        probe: &dyn LivenessProbe,
        resolver: Option<&dyn HostResolver>,
        workers: usize,
    ) -> Vec<LiveHost> {
        let total = targets.len();
        debug!("Sweeping {} addresses with {} ({} workers)", total, probe.name(), workers);

        let live_hosts: Vec<LiveHost> = stream::iter(targets)
            .map(|ip| async move {
                let rtt = probe_host(probe, ip).await?;
                let hostname = match resolver {
                    Some(resolver) => crate::detect::hostname::resolve_or_none(resolver, ip).await,
                    None => None,
                };
                debug!("Found live host {} ({:?})", ip, rtt);
                Some(LiveHost {
                    address: ip,
                    hostname,
                    response_time: rtt,
                })
            })
            .buffer_unordered(workers.max(1))
            .filter_map(|host| async move { host })
            .collect()
            .await;

        info!("Sweep finished: {}/{} hosts answered", live_hosts.len(), total);
        live_hosts
    }
}

/// Local network interface lookup
pub mod interface {
    use super::*;

    /// One IPv4 address bound to a local interface
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct InterfaceNetwork {
        pub name: String,
        pub address: Ipv4Addr,
        pub network: String,
    }

    /// The /24 containing `ip`, in CIDR form
    pub fn calculate_network_cidr(ip: Ipv4Addr) -> String {
        let [a, b, c, _] = ip.octets();
        format!("{}.{}.{}.0/24", a, b, c)
    }

    /// All non-loopback IPv4 addresses on local interfaces
    pub fn list_network_interfaces() -> Result<Vec<InterfaceNetwork>> {
        let interfaces = NetworkInterface::show()?;
        let mut networks = Vec::new();
        for interface in interfaces {
            for addr in &interface.addr {
                if let IpAddr::V4(ipv4) = addr.ip() {
                    if !ipv4.is_loopback() && !ipv4.is_unspecified() {
                        networks.push(InterfaceNetwork {
                            name: interface.name.clone(),
                            address: ipv4,
                            network: calculate_network_cidr(ipv4),
                        });
                    }
                }
            }
        }
        Ok(networks)
    }

    /// Get the network CIDR for a specific interface name
    pub fn get_network_from_interface(interface_name: &str) -> Result<String> {
        list_network_interfaces()?
            .into_iter()
            .find(|n| n.name == interface_name)
            .map(|n| {
                debug!(
                    "Interface {} has IP {}, calculated network: {}",
                    interface_name, n.address, n.network
                );
                n.network
            })
            .ok_or_else(|| {
                NetworkDiscoveryError::NetworkInterfaceCustom(format!(
                    "Interface '{}' not found or has no valid IPv4 address",
                    interface_name
                ))
            })
    }
}

use crate::constants::{DEFAULT_GATEWAY_CANDIDATES, DEFAULT_PORT_CATALOG};
use crate::detect::classify::{default_signatures, Signature};
use crate::errors::{NetworkDiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// How the liveness sweep decides a host is up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMethod {
    /// ICMP echo, needs raw or ping-socket privileges
    #[default]
    Icmp,
    /// TCP connect to `liveness_tcp_ports`; refused or accepted both count as up
    TcpConnect,
}

/// Configuration settings for network scanning operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Ports probed on every live host during a detailed scan
    pub port_catalog: Vec<u16>,

    /// Timeout in milliseconds for a single liveness probe
    pub liveness_timeout_ms: u64,

    /// Timeout in milliseconds for a single TCP connection attempt
    pub connect_timeout_ms: u64,

    pub probe_method: ProbeMethod,

    /// Ports tried in order by the TCP liveness probe
    pub liveness_tcp_ports: Vec<u16>,

    /// Concurrent liveness probes across the range
    pub liveness_workers: usize,

    /// Concurrent hosts being enriched
    pub host_workers: usize,

    /// Concurrent port probes per host
    pub port_workers: usize,

    /// Attempt reverse DNS for hosts that answered
    pub resolve_hostnames: bool,

    /// Conventional gateway addresses, tried in order when the route table gives nothing
    pub gateway_candidates: Vec<IpAddr>,

    /// Smallest accepted CIDR prefix; anything wider is rejected
    pub min_prefix_len: u8,

    /// Signature catalog, evaluated in order
    pub signatures: Vec<Signature>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port_catalog: DEFAULT_PORT_CATALOG.to_vec(),
            liveness_timeout_ms: 1000,
            connect_timeout_ms: 1000,
            probe_method: ProbeMethod::Icmp,
            liveness_tcp_ports: vec![22, 80, 443, 445, 3389],
            liveness_workers: 50,
            host_workers: 8,
            port_workers: 20,
            resolve_hostnames: true,
            gateway_candidates: DEFAULT_GATEWAY_CANDIDATES
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
            min_prefix_len: 16,
            signatures: default_signatures(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetworkDiscoveryError::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ScanConfig = toml::from_str(content)
            .map_err(|e| NetworkDiscoveryError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NETSCOUT_*` environment overrides
    pub fn merge_env(mut self) -> Self {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.parse().ok())
        }

        if let Some(n) = parsed("NETSCOUT_LIVENESS_WORKERS") {
            self.liveness_workers = n;
        }
        if let Some(n) = parsed("NETSCOUT_HOST_WORKERS") {
            self.host_workers = n;
        }
        if let Some(n) = parsed("NETSCOUT_PORT_WORKERS") {
            self.port_workers = n;
        }
        if let Some(ms) = parsed("NETSCOUT_LIVENESS_TIMEOUT_MS") {
            self.liveness_timeout_ms = ms;
        }
        if let Some(ms) = parsed("NETSCOUT_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = ms;
        }
        if let Ok(method) = std::env::var("NETSCOUT_PROBE_METHOD") {
            match method.as_str() {
                "icmp" => self.probe_method = ProbeMethod::Icmp,
                "tcp_connect" | "tcp" => self.probe_method = ProbeMethod::TcpConnect,
                _ => {}
            }
        }

        self
    }

    /// Reject settings the sweep cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(NetworkDiscoveryError::Configuration(msg.to_string()));

        if self.liveness_workers == 0 || self.host_workers == 0 || self.port_workers == 0 {
            return invalid("worker counts must be at least 1");
        }
        if self.liveness_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return invalid("probe timeouts must be non-zero");
        }
        if self.port_catalog.is_empty() {
            return invalid("port catalog is empty");
        }
        if self.probe_method == ProbeMethod::TcpConnect && self.liveness_tcp_ports.is_empty() {
            return invalid("tcp_connect liveness needs at least one port");
        }
        if self.min_prefix_len > 32 {
            return invalid("min_prefix_len must be <= 32");
        }
        Ok(())
    }

    /// Port catalog sorted and deduplicated
    pub fn port_catalog(&self) -> Vec<u16> {
        let mut ports = self.port_catalog.clone();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Upper bound on concurrent connection attempts during enrichment
    pub fn max_in_flight_connects(&self) -> usize {
        self.host_workers.saturating_mul(self.port_workers)
    }

    pub fn set_liveness_workers(&mut self, jobs: usize) {
        self.liveness_workers = jobs.max(1);
    }

    pub fn set_host_workers(&mut self, jobs: usize) {
        self.host_workers = jobs.max(1);
    }

    pub fn set_port_workers(&mut self, jobs: usize) {
        self.port_workers = jobs.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.liveness_workers, 50);
        assert_eq!(config.port_workers, 20);
        assert_eq!(config.max_in_flight_connects(), 160);
        assert_eq!(config.gateway_candidates.len(), 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScanConfig::from_toml(
            r#"
            port_workers = 5
            probe_method = "tcp_connect"
            gateway_candidates = ["10.1.1.1"]
            "#,
        )
        .unwrap();
        assert_eq!(config.port_workers, 5);
        assert_eq!(config.liveness_workers, 50);
        assert_eq!(config.probe_method, ProbeMethod::TcpConnect);
        assert_eq!(config.gateway_candidates, vec!["10.1.1.1".parse::<IpAddr>().unwrap()]);
        assert!(!config.signatures.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ScanConfig::from_toml("host_workers = 0").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_port_catalog_is_sorted_and_deduplicated() {
        let config = ScanConfig {
            port_catalog: vec![443, 22, 139, 22, 80, 139],
            ..ScanConfig::default()
        };
        assert_eq!(config.port_catalog(), vec![22, 80, 139, 443]);
    }

    #[test]
    fn test_worker_setters_clamp_to_one() {
        let mut config = ScanConfig::default();
        config.set_liveness_workers(0);
        config.set_port_workers(0);
        assert_eq!(config.liveness_workers, 1);
        assert_eq!(config.port_workers, 1);
    }
}

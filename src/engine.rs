use crate::config::ScanConfig;
use crate::db::oui;
use crate::detect::classify::{DeviceClassifier, HostEvidence};
use crate::detect::hostname::{HostResolver, ReverseDnsResolver};
use crate::detect::mac::{self, NeighborTable, SystemNeighborTable};
use crate::detect::os::infer_operating_system;
use crate::detect::port::{enumerate_services, PortProbe, TcpConnectPortProbe};
use crate::errors::Result;
use crate::model::{Device, DeviceProfile, LiveHost};
use crate::net::ping::{self, parallel_ping_sweep, LivenessProbe};
use crate::net::range::parse_range;
use crate::registry::ScanRegistry;
use crate::snapshot::{default_export_path, write_snapshot, ScanSnapshot};
use crate::topology::{self, RouteTable, SystemRouteTable, Topology};
use futures::stream::{self, StreamExt};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, trace, Instrument};

/// Liveness only, or liveness followed by per-host enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    LivenessOnly,
    #[default]
    Detailed,
}

/// Discovery engine: sweep, enrich, classify, register
pub struct NetworkDiscovery {
    config: Arc<ScanConfig>,
    liveness: Arc<dyn LivenessProbe>,
    ports: Arc<dyn PortProbe>,
    resolver: Arc<dyn HostResolver>,
    neighbors: Arc<dyn NeighborTable>,
    routes: Arc<dyn RouteTable>,
    classifier: DeviceClassifier,
    registry: Arc<ScanRegistry>,
}

impl NetworkDiscovery {
    /// Engine backed by the real OS collaborators
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let liveness = ping::probe_for(&config);
        let connect_timeout = config.connect_timeout();

        Ok(Self {
            liveness,
            ports: Arc::new(TcpConnectPortProbe::new(connect_timeout)),
            resolver: Arc::new(ReverseDnsResolver::new(connect_timeout)),
            neighbors: Arc::new(SystemNeighborTable::new(connect_timeout)),
            routes: Arc::new(SystemRouteTable::new(connect_timeout)),
            classifier: DeviceClassifier::new(config.signatures.clone()),
            registry: Arc::new(ScanRegistry::new()),
            config: Arc::new(config),
        })
    }

    pub fn with_liveness_probe(mut self, probe: Arc<dyn LivenessProbe>) -> Self {
        self.liveness = probe;
        self
    }

    pub fn with_port_probe(mut self, probe: Arc<dyn PortProbe>) -> Self {
        self.ports = probe;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_neighbor_table(mut self, neighbors: Arc<dyn NeighborTable>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_route_table(mut self, routes: Arc<dyn RouteTable>) -> Self {
        self.routes = routes;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<ScanRegistry> {
        self.registry.clone()
    }

    /// Find the hosts in `range` that answer a liveness probe.
    ///
    /// An invalid descriptor fails before any probe is sent; individual probe
    /// failures only drop the address.
    pub async fn sweep(&self, range: &str) -> Result<Vec<LiveHost>> {
        let targets = parse_range(range, self.config.min_prefix_len)?;
        let resolver = self.config.resolve_hostnames.then(|| self.resolver.as_ref());

        Ok(parallel_ping_sweep(targets, self.liveness.as_ref(), resolver, self.config.liveness_workers).await)
    }

    /// Ports, MAC, classification, OS and vendor for one live host
    pub async fn enrich(&self, host: LiveHost) -> Device {
        let address = host.address;
        let catalog = self.config.port_catalog();
        let scan = enumerate_services(self.ports.as_ref(), address, &catalog, self.config.port_workers).await;

        let mac_address = match self.neighbors.lookup(address).await {
            Ok(mac) => mac.and_then(|m| oui::normalize_mac(&m)),
            Err(e) => {
                trace!(code = e.code(), "neighbor lookup for {} failed: {}", address, e);
                None
            }
        };

        let device_type = self.classifier.classify(&HostEvidence {
            hostname: host.hostname.as_deref(),
            open_ports: &scan.open_ports,
            services: &scan.services,
        });
        let operating_system = infer_operating_system(&scan.open_ports, device_type).to_string();
        let vendor = mac::infer_vendor(mac_address.as_deref());

        debug!(
            "{} classified as {} (os: {}, vendor: {}, {} open ports)",
            address,
            device_type,
            operating_system,
            vendor,
            scan.open_ports.len()
        );

        let mut device = Device::from_live_host(host).with_profile(DeviceProfile {
            device_type,
            operating_system,
            vendor,
            open_ports: scan.open_ports,
            services: scan.services,
        });
        device.mac_address = mac_address;
        device
    }

    /// Sweep `range`, optionally enrich every live host, and register the results.
    ///
    /// Returns the devices observed by this sweep. One history entry is appended
    /// per call.
    pub async fn scan(&self, range: &str, mode: ScanMode) -> Result<Vec<Device>> {
        let span = info_span!("scan", range = %range, mode = ?mode);
        async move {
            let started = Instant::now();
            let live_hosts = self.sweep(range).await?;
            info!("Found {} live hosts", live_hosts.len());

            let devices: Vec<Device> = match mode {
                ScanMode::LivenessOnly => live_hosts.into_iter().map(Device::from_live_host).collect(),
                ScanMode::Detailed => {
                    info!(
                        "Enriching {} hosts ({} hosts x {} ports in flight at most)",
                        live_hosts.len(),
                        self.config.host_workers,
                        self.config.port_workers
                    );
                    stream::iter(live_hosts)
                        .map(|host| self.enrich(host))
                        .buffer_unordered(self.config.host_workers)
                        .collect()
                        .await
                }
            };

            for device in &devices {
                self.registry.upsert(device.clone()).await;
            }
            self.registry.record_scan(range, devices.len()).await;

            info!(
                "Scan of {} finished in {:.2}s: {} devices",
                range,
                started.elapsed().as_secs_f64(),
                devices.len()
            );
            Ok(devices)
        }
        .instrument(span)
        .await
    }

    /// Default route, else the first conventional gateway that answers
    pub async fn detect_gateway(&self) -> Option<IpAddr> {
        topology::detect_gateway(
            self.routes.as_ref(),
            self.liveness.as_ref(),
            &self.config.gateway_candidates,
        )
        .await
    }

    /// Fresh topology over the current registry
    pub async fn topology(&self) -> Topology {
        let gateway = self.detect_gateway().await;
        let devices = self.registry.devices().await;
        topology::synthesize(&devices, gateway)
    }

    /// Devices, topology, history and counters in one document
    pub async fn export_snapshot(&self) -> ScanSnapshot {
        let gateway = self.detect_gateway().await;
        self.registry.export_snapshot(gateway).await
    }

    /// Export to `path`, or to `network_scan_<ts>.json` in the working directory
    pub async fn export_to_file(&self, path: Option<&Path>) -> Result<PathBuf> {
        let snapshot = self.export_snapshot().await;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_export_path(snapshot.scan_timestamp));
        write_snapshot(&snapshot, path).await
    }
}

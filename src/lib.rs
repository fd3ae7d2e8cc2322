//! netscout - network discovery and device classification
//!
//! This library provides:
//! - Liveness sweeps over CIDR and dash ranges
//! - Per-host service enumeration
//! - Signature-based device classification with OS and vendor inference
//! - A scan registry with topology synthesis and JSON export

pub mod config;
pub mod constants;
pub mod db;
pub mod detect;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod model;
pub mod net;
pub mod registry;
pub mod snapshot;
pub mod topology;

// Re-export commonly used types for convenience
pub use config::{ProbeMethod, ScanConfig};
pub use detect::{DeviceClassifier, HostResolver, NeighborTable, PortProbe, Signature};
pub use engine::{NetworkDiscovery, ScanMode};
pub use errors::{NetworkDiscoveryError, Result};
pub use model::{Device, DeviceProfile, DeviceStatus, DeviceType, LiveHost, ServiceScan};
pub use net::ping::LivenessProbe;
pub use registry::ScanRegistry;
pub use snapshot::ScanSnapshot;
pub use topology::{RouteTable, Topology};

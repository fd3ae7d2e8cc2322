use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the discovery engine
pub type Result<T> = std::result::Result<T, NetworkDiscoveryError>;

/// Error types for network discovery operations
///
/// Only `Configuration` and `ExportIo` ever reach the caller of a scan. Probe and
/// resolution errors are produced by the collaborator seams and absorbed by the
/// engine as missing data.
#[derive(Error, Debug)]
pub enum NetworkDiscoveryError {
    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Probe timed out: {target}{}", .port.map(|p| format!(":{}", p)).unwrap_or_default())]
    ProbeTimeout { target: IpAddr, port: Option<u16> },

    #[error("Probe failed for {target}: {reason}")]
    ProbeUnreachable { target: IpAddr, reason: String },

    #[error("Resolution Error: {0}")]
    ResolutionFailure(String),

    #[error("Failed to write snapshot to {}: {source}", .path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network Interface Error: {0}")]
    NetworkInterface(#[from] network_interface::Error),

    #[error("Network Interface Error: {0}")]
    NetworkInterfaceCustom(String),
}

impl NetworkDiscoveryError {
    /// Errors that abort a sweep before any probing happens
    pub fn is_fatal(&self) -> bool {
        matches!(self, NetworkDiscoveryError::Configuration(_))
    }

    /// Per-probe errors; the sweeper and enumerator drop the address or port
    pub fn is_probe_failure(&self) -> bool {
        matches!(
            self,
            NetworkDiscoveryError::ProbeTimeout { .. } | NetworkDiscoveryError::ProbeUnreachable { .. }
        )
    }

    /// Short code for log fields
    pub fn code(&self) -> &'static str {
        match self {
            NetworkDiscoveryError::Configuration(_) => "CONFIG_ERROR",
            NetworkDiscoveryError::ProbeTimeout { .. } => "PROBE_TIMEOUT",
            NetworkDiscoveryError::ProbeUnreachable { .. } => "PROBE_UNREACHABLE",
            NetworkDiscoveryError::ResolutionFailure(_) => "RESOLUTION_FAILED",
            NetworkDiscoveryError::ExportIo { .. } => "EXPORT_IO",
            NetworkDiscoveryError::Io(_) => "IO_ERROR",
            NetworkDiscoveryError::Json(_) => "JSON_ERROR",
            NetworkDiscoveryError::NetworkInterface(_)
            | NetworkDiscoveryError::NetworkInterfaceCustom(_) => "INTERFACE_ERROR",
        }
    }
}

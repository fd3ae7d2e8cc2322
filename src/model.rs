use crate::constants::UNKNOWN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Device category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Router,
    Printer,
    Nas,
    Server,
    WindowsServer,
    LinuxServer,
    WebServer,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "router",
            DeviceType::Printer => "printer",
            DeviceType::Nas => "nas",
            DeviceType::Server => "server",
            DeviceType::WindowsServer => "windows_server",
            DeviceType::LinuxServer => "linux_server",
            DeviceType::WebServer => "web_server",
            DeviceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Observation status. A sweep never produces an offline value; hosts that did
/// not answer are simply absent from that sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Unknown,
}

/// A host that answered the liveness probe
#[derive(Debug, Clone, PartialEq)]
pub struct LiveHost {
    pub address: IpAddr,
    /// Reverse-resolved name, `None` when resolution failed
    pub hostname: Option<String>,
    pub response_time: Duration,
}

/// Open ports and their service labels, produced by one full pass over the
/// port catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceScan {
    pub open_ports: BTreeSet<u16>,
    pub services: BTreeMap<u16, String>,
}

/// Everything a detailed scan derives for a host. Replaced as one unit so ports,
/// services and the classification never come from different passes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    pub operating_system: String,
    pub vendor: String,
    pub open_ports: BTreeSet<u16>,
    pub services: BTreeMap<u16, String>,
}

/// A discovered network device, keyed by address in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub address: IpAddr,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub response_time: Duration,
    pub last_seen: DateTime<Utc>,
    pub status: DeviceStatus,
    /// `None` until a detailed scan has classified the host
    pub profile: Option<DeviceProfile>,
}

impl Device {
    /// Create a device from a liveness hit, before any enrichment
    pub fn from_live_host(host: LiveHost) -> Self {
        Self {
            address: host.address,
            hostname: host.hostname,
            mac_address: None,
            response_time: host.response_time,
            last_seen: Utc::now(),
            status: DeviceStatus::Online,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn hostname_or_unknown(&self) -> &str {
        self.hostname.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn device_type(&self) -> DeviceType {
        self.profile.as_ref().map_or(DeviceType::Unknown, |p| p.device_type)
    }

    pub fn operating_system(&self) -> &str {
        self.profile.as_ref().map_or(UNKNOWN, |p| p.operating_system.as_str())
    }

    pub fn vendor(&self) -> &str {
        self.profile.as_ref().map_or(UNKNOWN, |p| p.vendor.as_str())
    }

    pub fn open_ports(&self) -> Vec<u16> {
        self.profile
            .as_ref()
            .map(|p| p.open_ports.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn open_port_count(&self) -> usize {
        self.profile.as_ref().map_or(0, |p| p.open_ports.len())
    }

    pub fn services(&self) -> BTreeMap<u16, String> {
        self.profile.as_ref().map(|p| p.services.clone()).unwrap_or_default()
    }
}

/// One completed sweep. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub range: String,
    pub devices_found: usize,
}

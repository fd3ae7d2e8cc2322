//! Self-contained export document

use crate::errors::{NetworkDiscoveryError, Result};
use crate::model::{Device, DeviceStatus, DeviceType, ScanHistoryEntry};
use crate::topology::Topology;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Flat device record as it appears in an export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub address: IpAddr,
    pub hostname: String,
    /// Empty when the neighbor table had no entry
    pub mac_address: String,
    pub device_type: DeviceType,
    pub operating_system: String,
    pub vendor: String,
    pub open_ports: Vec<u16>,
    pub services: BTreeMap<u16, String>,
    pub response_time_ms: f64,
    pub last_seen: DateTime<Utc>,
    pub status: DeviceStatus,
}

impl From<&Device> for DeviceRecord {
    fn from(device: &Device) -> Self {
        Self {
            address: device.address,
            hostname: device.hostname_or_unknown().to_string(),
            mac_address: device.mac_address.clone().unwrap_or_default(),
            device_type: device.device_type(),
            operating_system: device.operating_system().to_string(),
            vendor: device.vendor().to_string(),
            open_ports: device.open_ports(),
            services: device.services(),
            response_time_ms: device.response_time.as_secs_f64() * 1000.0,
            last_seen: device.last_seen,
            status: device.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_devices: usize,
    pub device_type_counts: BTreeMap<DeviceType, usize>,
    pub total_open_ports: usize,
}

impl ScanSummary {
    pub fn from_devices<'a>(devices: impl IntoIterator<Item = &'a Device>) -> Self {
        let mut summary = ScanSummary {
            total_devices: 0,
            device_type_counts: BTreeMap::new(),
            total_open_ports: 0,
        };
        for device in devices {
            summary.total_devices += 1;
            *summary.device_type_counts.entry(device.device_type()).or_insert(0) += 1;
            summary.total_open_ports += device.open_port_count();
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub scan_timestamp: DateTime<Utc>,
    pub devices: Vec<DeviceRecord>,
    pub topology: Topology,
    pub scan_history: Vec<ScanHistoryEntry>,
    pub summary: ScanSummary,
}

impl ScanSnapshot {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `network_scan_<unix-seconds>.json`
pub fn default_export_path(at: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("network_scan_{}.json", at.timestamp()))
}

/// Write `snapshot` as pretty JSON. Failures come back as `ExportIo` and touch
/// nothing but the target file.
pub async fn write_snapshot(snapshot: &ScanSnapshot, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref().to_path_buf();
    let json = snapshot.to_json_pretty()?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| NetworkDiscoveryError::ExportIo {
            path: path.clone(),
            source,
        })?;
    info!("Scan results exported to {}", path.display());
    Ok(path)
}

use crate::detect::mac::infer_vendor;
use crate::model::{Device, ScanHistoryEntry};
use crate::snapshot::{DeviceRecord, ScanSnapshot, ScanSummary};
use crate::topology;
use chrono::Utc;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tokio::sync::RwLock;
use tracing::trace;

/// Discovered devices keyed by address, plus the append-only scan history.
///
/// Each operation holds the relevant lock for its whole duration, so readers see
/// a device either before or after an upsert, never in between.
#[derive(Debug, Default)]
pub struct ScanRegistry {
    devices: RwLock<BTreeMap<IpAddr, Device>>,
    history: RwLock<Vec<ScanHistoryEntry>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update by address.
    ///
    /// The first observation fixes the response time. Later records win for
    /// last-seen and status, and for hostname when they resolved one. A MAC is
    /// only overwritten by another MAC, and the enrichment profile is only
    /// replaced, as a whole, by a record that carries one. The stored vendor is
    /// always re-derived from the stored MAC.
    pub async fn upsert(&self, device: Device) {
        let mut devices = self.devices.write().await;
        match devices.get_mut(&device.address) {
            Some(existing) => {
                trace!("Updating {}", device.address);
                if device.hostname.is_some() {
                    existing.hostname = device.hostname;
                }
                existing.last_seen = device.last_seen;
                existing.status = device.status;
                if device.mac_address.is_some() {
                    existing.mac_address = device.mac_address;
                }
                if device.profile.is_some() {
                    existing.profile = device.profile;
                }
                if let Some(profile) = existing.profile.as_mut() {
                    profile.vendor = infer_vendor(existing.mac_address.as_deref());
                }
            }
            None => {
                trace!("Registering {}", device.address);
                devices.insert(device.address, device);
            }
        }
    }

    /// Append one history entry for a completed sweep
    pub async fn record_scan(&self, range: &str, devices_found: usize) {
        self.history.write().await.push(ScanHistoryEntry {
            timestamp: Utc::now(),
            range: range.to_string(),
            devices_found,
        });
    }

    /// Copy of all devices, ordered by address
    pub async fn devices(&self) -> Vec<Device> {
        self.devices.read().await.values().cloned().collect()
    }

    pub async fn get(&self, address: IpAddr) -> Option<Device> {
        self.devices.read().await.get(&address).cloned()
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    pub async fn history(&self) -> Vec<ScanHistoryEntry> {
        self.history.read().await.clone()
    }

    /// Build an export from one consistent view of the registry. Read-only.
    pub async fn export_snapshot(&self, gateway: Option<IpAddr>) -> ScanSnapshot {
        let devices = self.devices().await;
        let scan_history = self.history().await;

        ScanSnapshot {
            scan_timestamp: Utc::now(),
            devices: devices.iter().map(DeviceRecord::from).collect(),
            topology: topology::synthesize(&devices, gateway),
            scan_history,
            summary: ScanSummary::from_devices(&devices),
        }
    }
}

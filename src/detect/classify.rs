//! Signature-based device classification
//!
//! Each catalog entry is scored against the host: +3 per hostname fragment
//! found in the hostname, +2 per open port in the entry's port set, +2 per
//! service label equal to one of the entry's service names. Entries are tried in
//! catalog order and the first to reach [`MATCH_THRESHOLD`] wins. Below that,
//! fixed port rules decide.

use crate::constants::{RDP_PORT, SSH_PORT, WEB_PORTS};
use crate::model::DeviceType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MATCH_THRESHOLD: u32 = 3;

const HOSTNAME_WEIGHT: u32 = 3;
const PORT_WEIGHT: u32 = 2;
const SERVICE_WEIGHT: u32 = 2;

/// Expected evidence for one device category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub device_type: DeviceType,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Signature {
    fn new(device_type: DeviceType, hostnames: &[&str], ports: &[u16], services: &[&str]) -> Self {
        Self {
            device_type,
            hostnames: hostnames.iter().map(|s| s.to_string()).collect(),
            ports: ports.to_vec(),
            services: services.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Weighted evidence score for `host`
    pub fn score(&self, host: &HostEvidence<'_>) -> u32 {
        let hostname_hits = host.hostname.map_or(0, |name| {
            let name = name.to_lowercase();
            self.hostnames
                .iter()
                .filter(|fragment| name.contains(&fragment.to_lowercase()))
                .count()
        });

        let mut expected_ports: Vec<u16> = self.ports.clone();
        expected_ports.sort_unstable();
        expected_ports.dedup();
        let port_hits = expected_ports.iter().filter(|p| host.open_ports.contains(*p)).count();

        let service_hits = host
            .services
            .values()
            .filter(|label| self.services.iter().any(|s| s == *label))
            .count();

        hostname_hits as u32 * HOSTNAME_WEIGHT + port_hits as u32 * PORT_WEIGHT + service_hits as u32 * SERVICE_WEIGHT
    }
}

/// Built-in catalog, in evaluation order
pub fn default_signatures() -> Vec<Signature> {
    vec![
        Signature::new(
            DeviceType::Router,
            &["router", "gateway", "fritz", "netgear", "linksys"],
            &[80, 443, 22, 23, 8080],
            &["http", "https", "ssh", "telnet"],
        ),
        Signature::new(
            DeviceType::Printer,
            &["printer", "hp", "canon", "epson", "brother"],
            &[631, 515, 9100, 80],
            &["ipp", "lpd", "jetdirect", "http"],
        ),
        Signature::new(
            DeviceType::Nas,
            &["nas", "synology", "qnap", "storage"],
            &[22, 80, 443, 5000, 5001, 139, 445],
            &["ssh", "http", "https", "synology", "qnap", "smb"],
        ),
        Signature::new(
            DeviceType::Server,
            &["server", "srv", "web", "db", "mail"],
            &[22, 80, 443, 3389, 5432, 3306],
            &["ssh", "http", "https", "rdp", "postgresql", "mysql"],
        ),
    ]
}

/// What the classifier looks at
#[derive(Debug, Clone, Copy)]
pub struct HostEvidence<'a> {
    pub hostname: Option<&'a str>,
    pub open_ports: &'a BTreeSet<u16>,
    pub services: &'a BTreeMap<u16, String>,
}

/// Stateless classifier over a fixed signature catalog
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    signatures: Vec<Signature>,
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new(default_signatures())
    }
}

impl DeviceClassifier {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Exactly one device type for `host`
    pub fn classify(&self, host: &HostEvidence<'_>) -> DeviceType {
        self.signatures
            .iter()
            .find(|sig| sig.score(host) >= MATCH_THRESHOLD)
            .map(|sig| sig.device_type)
            .unwrap_or_else(|| fallback_type(host.open_ports))
    }
}

fn fallback_type(open_ports: &BTreeSet<u16>) -> DeviceType {
    let has_web = WEB_PORTS.iter().any(|p| open_ports.contains(p));

    if open_ports.contains(&RDP_PORT) {
        DeviceType::WindowsServer
    } else if open_ports.contains(&SSH_PORT) && !has_web {
        DeviceType::LinuxServer
    } else if has_web {
        DeviceType::WebServer
    } else {
        DeviceType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::port::service_label;

    fn classify(hostname: Option<&str>, ports: &[u16]) -> DeviceType {
        let open_ports: BTreeSet<u16> = ports.iter().copied().collect();
        let services: BTreeMap<u16, String> = ports.iter().map(|&p| (p, service_label(p))).collect();
        DeviceClassifier::default().classify(&HostEvidence {
            hostname,
            open_ports: &open_ports,
            services: &services,
        })
    }

    #[test]
    fn test_router_by_hostname_and_port() {
        assert_eq!(classify(Some("router-gw"), &[22, 80]), DeviceType::Router);
    }

    #[test]
    fn test_hostname_alone_reaches_threshold() {
        assert_eq!(classify(Some("Office-Printer.lan"), &[]), DeviceType::Printer);
    }

    #[test]
    fn test_catalog_order_breaks_ties() {
        // 80 + 443 score 4 for router, nas and server alike; router comes first
        assert_eq!(classify(None, &[80, 443]), DeviceType::Router);
        // 9100 + 631 only match the printer entry
        assert_eq!(classify(None, &[631, 9100]), DeviceType::Printer);
        assert_eq!(classify(None, &[5000, 5001]), DeviceType::Nas);
        assert_eq!(classify(None, &[3306, 5432]), DeviceType::Server);
    }

    #[test]
    fn test_fallback_rules() {
        assert_eq!(classify(None, &[3389]), DeviceType::WindowsServer);
        assert_eq!(classify(None, &[22]), DeviceType::LinuxServer);
        assert_eq!(classify(None, &[8443]), DeviceType::WebServer);
        assert_eq!(classify(None, &[]), DeviceType::Unknown);
        assert_eq!(classify(Some("unknown"), &[25]), DeviceType::Unknown);
    }

    #[test]
    fn test_service_labels_match_exactly() {
        let sig = Signature::new(DeviceType::Nas, &[], &[], &["SMB"]);
        let open_ports: BTreeSet<u16> = [445].into_iter().collect();
        let services: BTreeMap<u16, String> = [(445, "SMB".to_string())].into_iter().collect();
        let host = HostEvidence {
            hostname: None,
            open_ports: &open_ports,
            services: &services,
        };
        assert_eq!(sig.score(&host), 2);

        let lower = Signature::new(DeviceType::Nas, &[], &[], &["smb"]);
        assert_eq!(lower.score(&host), 0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = classify(Some("db-01"), &[22, 5432]);
        for _ in 0..10 {
            assert_eq!(classify(Some("db-01"), &[22, 5432]), first);
        }
    }
}

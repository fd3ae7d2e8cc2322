use crate::db::oui;
use crate::errors::{NetworkDiscoveryError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

const UNKNOWN_VENDOR: &str = "Unknown";

static MAC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9a-fA-F]{1,2}[:-]){5}[0-9a-fA-F]{1,2}").expect("static MAC regex"));

/// Local neighbor (ARP) table lookup
#[async_trait]
pub trait NeighborTable: Send + Sync {
    /// Hardware address cached for `ip`, if any
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>>;
}

/// Reads the kernel neighbor cache, falling back to the `arp` utility
pub struct SystemNeighborTable {
    timeout: Duration,
}

impl SystemNeighborTable {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn from_proc(&self, ip: IpAddr) -> Result<Option<String>> {
        let table = tokio::fs::read_to_string("/proc/net/arp").await?;
        Ok(parse_proc_arp(&table, ip))
    }

    async fn from_arp_command(&self, ip: IpAddr) -> Result<Option<String>> {
        let output = timeout(self.timeout, Command::new("arp").arg("-a").arg(ip.to_string()).output())
            .await
            .map_err(|_| NetworkDiscoveryError::ResolutionFailure(format!("arp -a {} timed out", ip)))??;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_arp_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl NeighborTable for SystemNeighborTable {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>> {
        match self.from_proc(ip).await {
            Ok(Some(mac)) => return Ok(Some(mac)),
            Ok(None) => {}
            Err(e) => trace!("/proc/net/arp unavailable: {}", e),
        }
        self.from_arp_command(ip).await
    }
}

/// Find `ip` in `/proc/net/arp` content. Incomplete entries carry an all-zero
/// hardware address and are skipped.
pub fn parse_proc_arp(table: &str, ip: IpAddr) -> Option<String> {
    let wanted = ip.to_string();
    table
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|cols| cols.len() >= 4 && cols[0] == wanted)
        .and_then(|cols| oui::normalize_mac(cols[3]))
        .filter(|mac| mac != "00:00:00:00:00:00")
}

/// First MAC-looking token in `arp -a` output
pub fn parse_arp_output(output: &str) -> Option<String> {
    MAC_PATTERN
        .find_iter(output)
        .filter_map(|m| {
            // BSD arp prints single-digit octets ("0:c:29:...")
            let padded = m
                .as_str()
                .split(|c| c == ':' || c == '-')
                .map(|octet| format!("{:0>2}", octet))
                .collect::<Vec<_>>()
                .join(":");
            oui::normalize_mac(&padded)
        })
        .find(|mac| mac != "00:00:00:00:00:00")
}

/// Vendor guess from a MAC address. An absent MAC short-circuits without a lookup.
pub fn infer_vendor(mac: Option<&str>) -> String {
    match mac {
        None => UNKNOWN_VENDOR.to_string(),
        Some(mac) if mac.trim().is_empty() => UNKNOWN_VENDOR.to_string(),
        Some(mac) => oui::lookup_vendor(mac).unwrap_or(UNKNOWN_VENDOR).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const PROC_ARP: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.1.1      0x1         0x2         3c:07:54:12:34:56     *        eth0
192.168.1.20     0x1         0x0         00:00:00:00:00:00     *        eth0
";

    #[test]
    fn test_parse_proc_arp() {
        let gw = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(parse_proc_arp(PROC_ARP, gw).as_deref(), Some("3C:07:54:12:34:56"));

        let incomplete = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(parse_proc_arp(PROC_ARP, incomplete), None);

        let absent = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 99));
        assert_eq!(parse_proc_arp(PROC_ARP, absent), None);
    }

    #[test]
    fn test_parse_arp_output() {
        let windows = "  192.168.1.5           00-15-5d-01-02-03     dynamic";
        assert_eq!(parse_arp_output(windows).as_deref(), Some("00:15:5D:01:02:03"));

        let bsd = "? (192.168.1.9) at 0:c:29:a:b:c on en0 ifscope [ethernet]";
        assert_eq!(parse_arp_output(bsd).as_deref(), Some("00:0C:29:0A:0B:0C"));

        assert_eq!(parse_arp_output("192.168.1.9 (incomplete)"), None);
    }

    #[test]
    fn test_infer_vendor() {
        assert_eq!(infer_vendor(Some("08:00:27:11:22:33")), "VirtualBox");
        assert_eq!(infer_vendor(Some("3C-07-54-00-00-01")), "AVM (FritzBox)");
        assert_eq!(infer_vendor(Some("00:11:22:33:44:55")), "Unknown");
        assert_eq!(infer_vendor(Some("")), "Unknown");
        assert_eq!(infer_vendor(None), "Unknown");
    }
}

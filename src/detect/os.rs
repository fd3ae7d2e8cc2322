use crate::constants::{MS_RPC_PORT, PRINTER_PORTS, SSH_PORT, WINDOWS_PORTS};
use crate::model::DeviceType;
use std::collections::BTreeSet;

pub const OS_WINDOWS: &str = "Windows";
pub const OS_ROUTER: &str = "Embedded/Router OS";
pub const OS_UNIX: &str = "Linux/Unix";
pub const OS_PRINTER: &str = "Printer Firmware";
pub const OS_UNKNOWN: &str = "Unknown";

/// Best-effort operating system guess from open ports and the assigned device type.
///
/// Precedence: Windows service ports, then the router type, then a shell port
/// without MS-RPC, then printer ports or type.
pub fn infer_operating_system(open_ports: &BTreeSet<u16>, device_type: DeviceType) -> &'static str {
    if WINDOWS_PORTS.iter().any(|p| open_ports.contains(p)) {
        return OS_WINDOWS;
    }

    if device_type == DeviceType::Router {
        return OS_ROUTER;
    }

    if open_ports.contains(&SSH_PORT) && !open_ports.contains(&MS_RPC_PORT) {
        return OS_UNIX;
    }

    if device_type == DeviceType::Printer || PRINTER_PORTS.iter().any(|p| open_ports.contains(p)) {
        return OS_PRINTER;
    }

    OS_UNKNOWN
}

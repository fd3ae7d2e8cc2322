use crate::constants::BUILTIN_OUI;
use eui48::MacAddress;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// OUI (Organizationally Unique Identifier) vendor lookup
pub mod oui {
    use super::*;

    static OUI_TABLE: Lazy<HashMap<&'static str, &'static str>> =
        Lazy::new(|| BUILTIN_OUI.iter().copied().collect());

    /// Normalize a MAC address to upper-case `XX:XX:XX:XX:XX:XX`.
    ///
    /// Accepts `:` or `-` separators, dotted Cisco form and bare hex. Returns
    /// `None` for anything that does not parse as a 48-bit address.
    pub fn normalize_mac(mac: &str) -> Option<String> {
        let clean = mac.trim().replace('-', ":");
        let parsed = MacAddress::parse_str(&clean).ok().or_else(|| {
            let hex: String = clean.chars().filter(|c| c.is_ascii_hexdigit()).collect();
            if hex.len() == 12 && clean.chars().all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':') {
                let bytes: Vec<u8> = (0..6)
                    .filter_map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
                    .collect();
                MacAddress::from_bytes(&bytes).ok()
            } else {
                None
            }
        })?;
        Some(parsed.to_hex_string().to_uppercase())
    }

    /// First three octets of a normalized MAC
    pub fn oui_prefix(mac: &str) -> Option<String> {
        normalize_mac(mac).map(|m| m[..8].to_string())
    }

    /// Vendor label for a MAC address, `None` on a table miss or malformed MAC
    pub fn lookup_vendor(mac: &str) -> Option<&'static str> {
        let prefix = oui_prefix(mac)?;
        OUI_TABLE.get(prefix.as_str()).copied()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_normalize_mac_formats() {
            assert_eq!(normalize_mac("3c-07-54-aa-bb-cc").as_deref(), Some("3C:07:54:AA:BB:CC"));
            assert_eq!(normalize_mac("3c07.54aa.bbcc").as_deref(), Some("3C:07:54:AA:BB:CC"));
            assert_eq!(normalize_mac("3C0754AABBCC").as_deref(), Some("3C:07:54:AA:BB:CC"));
            assert_eq!(normalize_mac("invalid-mac"), None);
        }

        #[test]
        fn test_lookup_vendor() {
            assert_eq!(lookup_vendor("00:50:56:01:02:03"), Some("VMware"));
            assert_eq!(lookup_vendor("f8-1a-67-00-00-01"), Some("Synology"));
            assert_eq!(lookup_vendor("00:11:22:33:44:55"), None);
        }
    }
}

/// Built-in OUI (Organizationally Unique Identifier) table, keyed by the first
/// three octets in upper-case colon form
pub const BUILTIN_OUI: &[(&str, &str)] = &[
    ("00:00:5E", "IANA"),
    ("00:17:F2", "Apple, Inc."),
    ("00:1C:B3", "Apple, Inc."),
    ("00:26:BB", "Apple, Inc."),
    ("00:1A:11", "Samsung Electronics Co.,Ltd"),
    ("D8:27:27", "Samsung Electronics Co.,Ltd"),
    ("B8:27:EB", "Raspberry Pi Foundation"),
    ("00:0C:29", "VMware"),
    ("00:50:56", "VMware"),
    ("08:00:27", "VirtualBox"),
    ("00:0F:FE", "Intel Corporate"),
    ("00:1B:21", "Intel"),
    ("00:15:5D", "Microsoft"),
    ("00:18:8B", "Microsoft Corporation"),
    ("00:22:48", "Microsoft Corporation"),
    ("00:0D:3A", "Microsoft Corporation"),
    ("3C:07:54", "AVM (FritzBox)"),
    ("00:04:20", "AVM (FritzBox)"),
    ("F8:1A:67", "Synology"),
    ("00:11:32", "Synology"),
    ("00:00:0C", "Cisco Systems, Inc"),
    ("00:01:42", "Cisco Systems, Inc"),
    ("00:01:43", "Cisco Systems, Inc"),
    ("00:01:63", "Cisco Systems, Inc"),
    ("00:01:64", "Cisco Systems, Inc"),
    ("00:01:96", "Cisco Systems, Inc"),
    ("00:01:97", "Cisco Systems, Inc"),
    ("00:02:16", "Cisco Systems, Inc"),
];

/// Ports probed on every live host during a detailed scan
pub const DEFAULT_PORT_CATALOG: &[u16] = &[
    21,   // FTP
    22,   // SSH
    23,   // Telnet
    25,   // SMTP
    53,   // DNS
    80,   // HTTP
    110,  // POP3
    135,  // MS RPC
    139,  // NetBIOS
    143,  // IMAP
    443,  // HTTPS
    445,  // SMB
    515,  // LPD
    548,  // AFP
    554,  // RTSP
    631,  // IPP
    993,  // IMAPS
    995,  // POP3S
    1723, // PPTP
    1900, // UPnP
    3306, // MySQL
    3389, // RDP
    5000, // UPnP / DSM
    5001, // Synology DSM
    5432, // PostgreSQL
    8008, // HTTP-Alt
    8080, // HTTP-Proxy
    8443, // HTTPS-Alt
    9100, // JetDirect
];

/// Static port to service-label table
pub const SERVICE_NAMES: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (135, "RPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (515, "LPD"),
    (548, "AFP"),
    (554, "RTSP"),
    (631, "IPP"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1723, "PPTP"),
    (1900, "UPnP"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5000, "UPnP"),
    (5001, "Synology"),
    (5432, "PostgreSQL"),
    (8008, "HTTP-Alt"),
    (8080, "HTTP-Alt"),
    (8443, "HTTPS-Alt"),
    (9100, "JetDirect"),
];

/// Conventional gateway addresses tried when the route table gives nothing
pub const DEFAULT_GATEWAY_CANDIDATES: &[&str] = &["192.168.1.1", "192.168.0.1", "10.0.0.1", "172.16.0.1"];

pub const RDP_PORT: u16 = 3389;
pub const SSH_PORT: u16 = 22;
pub const WEB_PORTS: &[u16] = &[80, 443, 8000, 8008, 8080, 8443];
pub const WINDOWS_PORTS: &[u16] = &[135, 139, 3389];
pub const PRINTER_PORTS: &[u16] = &[631, 9100];
pub const MS_RPC_PORT: u16 = 135;

/// Placeholder used in exports for fields that could not be resolved
pub const UNKNOWN: &str = "unknown";

//! Per-host enrichment: service enumeration, hostname and MAC lookups, and the
//! pure classification and inference functions applied to their results.
//!
//! Every external collaborator sits behind a small async trait returning
//! `Result<Option<_>>`, so callers only ever see "data" or "no data".

pub mod classify;
pub mod hostname;
pub mod mac;
pub mod os;
pub mod port;

pub use classify::{DeviceClassifier, HostEvidence, Signature};
pub use hostname::{HostResolver, ReverseDnsResolver};
pub use mac::{NeighborTable, SystemNeighborTable};
pub use port::{PortProbe, TcpConnectPortProbe};

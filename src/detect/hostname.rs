use crate::errors::{NetworkDiscoveryError, Result};
use async_trait::async_trait;
use dns_lookup::lookup_addr;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Reverse name resolution for a live address
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> Result<Option<String>>;
}

/// Reverse DNS through the system resolver
pub struct ReverseDnsResolver {
    timeout: Duration,
}

impl ReverseDnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for ReverseDnsResolver {
    async fn resolve(&self, ip: IpAddr) -> Result<Option<String>> {
        let lookup = tokio::task::spawn_blocking(move || lookup_addr(&ip));
        let name = timeout(self.timeout, lookup)
            .await
            .map_err(|_| NetworkDiscoveryError::ResolutionFailure(format!("reverse lookup for {} timed out", ip)))?
            .map_err(|e| NetworkDiscoveryError::ResolutionFailure(e.to_string()))?
            .map_err(|e| NetworkDiscoveryError::ResolutionFailure(format!("{}: {}", ip, e)))?;

        // getnameinfo hands back the numeric form when no PTR record exists
        let name = name.trim_end_matches('.');
        if name.is_empty() || name.parse::<IpAddr>().is_ok() {
            return Ok(None);
        }
        Ok(Some(name.to_string()))
    }
}

/// Resolve `ip`, treating any failure as "no name"
pub async fn resolve_or_none(resolver: &dyn HostResolver, ip: IpAddr) -> Option<String> {
    match resolver.resolve(ip).await {
        Ok(name) => name,
        Err(e) => {
            trace!(code = e.code(), "hostname lookup for {} failed: {}", ip, e);
            None
        }
    }
}

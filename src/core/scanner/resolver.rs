// src/core/scanner/resolver.rs

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::TargetDomain;
use crate::core::models::{LiveHost, LiveHosts};

/// Forward name lookup.
///
/// Implementations answer with the addresses of a name, or `None` when the
/// name does not resolve for whatever reason. A failed lookup is never an
/// error at this level.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn lookup(&self, fqdn: &str) -> Option<Vec<IpAddr>>;
}

/// [`Resolve`] backed by hickory's async resolver.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
    lookup_timeout: Duration,
}

impl DnsResolver {
    /// Builds a resolver from the system configuration, falling back to the
    /// library defaults when `/etc/resolv.conf` (or the platform equivalent)
    /// cannot be read.
    pub fn new(lookup_timeout: Duration) -> Self {
        let (config, opts) = read_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read system resolver configuration, using defaults.");
            (ResolverConfig::default(), ResolverOpts::default())
        });
        Self::with_config(config, opts, lookup_timeout)
    }

    /// Resolver for an explicit set of name servers. `lookup_timeout` caps
    /// each query as well as the lookup as a whole.
    pub fn with_config(config: ResolverConfig, mut opts: ResolverOpts, lookup_timeout: Duration) -> Self {
        opts.timeout = lookup_timeout;
        opts.attempts = 1;
        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
            lookup_timeout,
        }
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn lookup(&self, fqdn: &str) -> Option<Vec<IpAddr>> {
        // Absolute name, so search domains from the system config never apply.
        let absolute = format!("{}.", fqdn.trim_end_matches('.'));

        // The resolver has its own per-query timeout; this caps the whole
        // lookup including any fallback across name servers.
        match timeout(self.lookup_timeout, self.inner.lookup_ip(absolute.as_str())).await {
            Ok(Ok(answer)) => {
                let addresses: Vec<IpAddr> = answer.iter().collect();
                if addresses.is_empty() { None } else { Some(addresses) }
            }
            Ok(Err(e)) => {
                trace!(host = fqdn, error = %e, "Lookup failed.");
                None
            }
            Err(_) => {
                debug!(host = fqdn, "Lookup timed out.");
                None
            }
        }
    }
}

/// Checks whether `label.target` resolves and records it as live if it does.
///
/// Any lookup failure counts as "not live"; nothing is recorded in that case.
pub async fn resolve<R>(resolver: &R, label: &str, target: &TargetDomain, live_hosts: &LiveHosts) -> bool
where
    R: Resolve + ?Sized,
{
    let fqdn = target.qualify(label);
    match resolver.lookup(&fqdn).await {
        Some(addresses) => {
            debug!(host = %fqdn, addresses = addresses.len(), "Host is live.");
            live_hosts.insert(LiveHost::new(fqdn, addresses)).await;
            true
        }
        None => false,
    }
}

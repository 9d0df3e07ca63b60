// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

// --- Core Data Models ---

/// A fully qualified host name that answered a forward lookup, together with
/// the addresses the lookup returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveHost {
    pub name: String,
    pub addresses: Vec<IpAddr>,
}

impl LiveHost {
    pub fn new(name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self { name: name.into(), addresses }
    }
}

/// The set of hosts confirmed live during the enumeration phase.
///
/// Cloning is cheap and every clone shares the same storage, so resolver tasks
/// each hold their own handle. Insertion is a set union keyed by host name:
/// the same name discovered twice is stored once and its addresses are merged.
#[derive(Debug, Clone, Default)]
pub struct LiveHosts {
    inner: Arc<Mutex<BTreeMap<String, Vec<IpAddr>>>>,
}

impl LiveHosts {
    /// Records a live host. Returns `true` if the name was not known before.
    pub async fn insert(&self, host: LiveHost) -> bool {
        let mut hosts = self.inner.lock().await;
        match hosts.get_mut(&host.name) {
            Some(known) => {
                for addr in host.addresses {
                    if !known.contains(&addr) {
                        known.push(addr);
                    }
                }
                false
            }
            None => {
                hosts.insert(host.name, host.addresses);
                true
            }
        }
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.lock().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Copies the current contents out, sorted by host name.
    pub async fn snapshot(&self) -> Vec<LiveHost> {
        self.inner
            .lock()
            .await
            .iter()
            .map(|(name, addresses)| LiveHost::new(name.clone(), addresses.clone()))
            .collect()
    }
}

/// The sealed port scan result of a single live host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortResult {
    /// Open ports in ascending order, each listed once.
    pub open_ports: Vec<u16>,
    /// When the last port probe of this host completed.
    pub scanned_at: DateTime<Utc>,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub candidates_checked: usize,
    /// Set when the run was interrupted; only fully scanned hosts are present.
    pub cancelled: bool,
    pub hosts: BTreeMap<String, PortResult>,
}

impl ScanReport {
    pub fn total_open_ports(&self) -> usize {
        self.hosts.values().map(|r| r.open_ports.len()).sum()
    }

    pub fn hosts_with_open_ports(&self) -> usize {
        self.hosts.values().filter(|r| !r.open_ports.is_empty()).count()
    }

    /// How many hosts have each port open, sorted by port.
    pub fn port_histogram(&self) -> BTreeMap<u16, usize> {
        let mut histogram = BTreeMap::new();
        for result in self.hosts.values() {
            for port in &result.open_ports {
                *histogram.entry(*port).or_insert(0) += 1;
            }
        }
        histogram
    }
}

// --- Progress Events ---

/// Progress notifications published by the orchestrator while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    EnumerationStarted { candidates: usize },
    CandidateResolved { host: String, live: bool },
    ProbingStarted { hosts: usize },
    HostSealed { host: String, open_ports: Vec<u16> },
}

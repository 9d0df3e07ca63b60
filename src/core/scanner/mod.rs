// src/core/scanner/mod.rs

pub mod port_prober;
pub mod resolver;

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ScanConfig, TargetDomain};
use crate::core::models::{LiveHost, LiveHosts, PortResult, ScanEvent, ScanReport};
use self::port_prober::{Probe, TcpProber};
use self::resolver::{resolve, DnsResolver, Resolve};

/// Runs both scan phases against a target.
///
/// Candidates are resolved under a bounded pool; only when every lookup has
/// finished does port probing start, again bounded, with all live hosts
/// scanned in parallel. Each host's record is sealed once all of its ports
/// have been checked.
pub struct ScanOrchestrator<R: ?Sized, P: ?Sized> {
    config: Arc<ScanConfig>,
    resolver: Arc<R>,
    prober: Arc<P>,
    cancel: CancellationToken,
    events: Option<UnboundedSender<ScanEvent>>,
}

impl ScanOrchestrator<DnsResolver, TcpProber> {
    /// Orchestrator wired to the real DNS resolver and TCP prober.
    pub fn with_network(config: ScanConfig) -> Self {
        let resolver = DnsResolver::new(config.lookup_timeout);
        Self::new(config, Arc::new(resolver), Arc::new(TcpProber))
    }
}

impl<R, P> ScanOrchestrator<R, P>
where
    R: Resolve + ?Sized + 'static,
    P: Probe + ?Sized + 'static,
{
    pub fn new(config: ScanConfig, resolver: Arc<R>, prober: Arc<P>) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            prober,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Uses `token` to stop dispatching new work when it is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Publishes progress on `events` while running.
    pub fn with_events(mut self, events: UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Executes a full run over `candidates` and returns the assembled report.
    ///
    /// Never fails: lookup and connection failures are folded into the
    /// results. If the run is cancelled the report carries `cancelled = true`
    /// and contains only the hosts whose port scan completed.
    pub async fn run(&self, candidates: Vec<String>) -> ScanReport {
        let started_at = Utc::now();
        let candidates_checked = candidates.len();
        info!(target = %self.config.target, candidates = candidates_checked, "Starting scan.");

        let live_hosts = self.enumerate(candidates).await;
        let hosts = live_hosts.snapshot().await;
        info!(live = hosts.len(), "Enumeration finished.");

        let results = self.probe_hosts(hosts).await;
        let cancelled = self.cancel.is_cancelled();
        info!(hosts = results.len(), cancelled, "Scan finished.");

        ScanReport {
            target: self.config.target.to_string(),
            started_at,
            finished_at: Utc::now(),
            candidates_checked,
            cancelled,
            hosts: results,
        }
    }

    /// Phase one: resolve every candidate. Returns only after every dispatched
    /// lookup has completed.
    pub async fn enumerate(&self, candidates: Vec<String>) -> LiveHosts {
        let live_hosts = LiveHosts::default();
        self.emit(ScanEvent::EnumerationStarted { candidates: candidates.len() });

        let semaphore = Arc::new(Semaphore::new(self.config.resolve_workers.max(1)));
        let mut tasks = JoinSet::new();

        for label in candidates {
            let Some(permit) = self.acquire(&semaphore).await else {
                info!("Enumeration cancelled, no further lookups dispatched.");
                break;
            };
            let resolver = Arc::clone(&self.resolver);
            let target: TargetDomain = self.config.target.clone();
            let live_hosts = live_hosts.clone();
            let events = self.events.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let live = resolve(resolver.as_ref(), &label, &target, &live_hosts).await;
                if let Some(events) = events {
                    let _ = events.send(ScanEvent::CandidateResolved { host: target.qualify(&label), live });
                }
            });
        }

        // Phase barrier.
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Resolver task failed.");
            }
        }
        live_hosts
    }

    /// Phase two: probe every configured port on every host and seal one
    /// record per host.
    pub async fn probe_hosts(&self, hosts: Vec<LiveHost>) -> BTreeMap<String, PortResult> {
        self.emit(ScanEvent::ProbingStarted { hosts: hosts.len() });

        let semaphore = Arc::new(Semaphore::new(self.config.probe_workers.max(1)));
        let ports: Arc<[u16]> = self.config.ports.clone().into();
        let mut host_tasks = JoinSet::new();

        for host in hosts {
            if self.cancel.is_cancelled() {
                break;
            }
            let job = HostScan {
                prober: Arc::clone(&self.prober),
                semaphore: Arc::clone(&semaphore),
                cancel: self.cancel.clone(),
                ports: Arc::clone(&ports),
                timeout: self.config.connect_timeout,
            };
            host_tasks.spawn(job.run(host));
        }

        // The orchestrator is the only writer of the result map.
        let mut results = BTreeMap::new();
        while let Some(joined) = host_tasks.join_next().await {
            match joined {
                Ok(Some((name, result))) => {
                    self.emit(ScanEvent::HostSealed {
                        host: name.clone(),
                        open_ports: result.open_ports.clone(),
                    });
                    results.insert(name, result);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Host scan task failed."),
            }
        }
        results
    }

    /// Waits for a worker slot, or returns `None` once the run is cancelled.
    async fn acquire(&self, semaphore: &Arc<Semaphore>) -> Option<OwnedSemaphorePermit> {
        acquire_slot(semaphore, &self.cancel).await
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(events) = &self.events {
            // A closed receiver must not disturb the scan.
            let _ = events.send(event);
        }
    }
}

async fn acquire_slot(semaphore: &Arc<Semaphore>, cancel: &CancellationToken) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
    }
}

/// Everything a single host's port scan needs, detached from the orchestrator
/// so it can run as its own task.
struct HostScan<P: ?Sized> {
    prober: Arc<P>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    ports: Arc<[u16]>,
    timeout: Duration,
}

impl<P: Probe + ?Sized + 'static> HostScan<P> {
    /// Returns the sealed record, or `None` if cancellation left some ports
    /// unchecked.
    async fn run(self, host: LiveHost) -> Option<(String, PortResult)> {
        let host = Arc::new(host);
        let mut tasks = JoinSet::new();
        let mut complete = true;

        for &port in self.ports.iter() {
            let Some(permit) = acquire_slot(&self.semaphore, &self.cancel).await else {
                complete = false;
                break;
            };
            let prober = Arc::clone(&self.prober);
            let host = Arc::clone(&host);
            let limit = self.timeout;
            tasks.spawn(async move {
                let _permit = permit;
                (port, prober.probe(&host, port, limit).await.is_some())
            });
        }

        let mut open_ports = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((port, true)) => {
                    debug!(host = %host.name, port, "Port open.");
                    open_ports.insert(port);
                }
                Ok((_, false)) => {}
                Err(e) => {
                    warn!(host = %host.name, error = %e, "Port probe task failed.");
                }
            }
        }

        if !complete {
            debug!(host = %host.name, "Port scan interrupted, record not sealed.");
            return None;
        }

        let result = PortResult {
            open_ports: open_ports.into_iter().collect(),
            scanned_at: Utc::now(),
            addresses: host.addresses.clone(),
        };
        info!(host = %host.name, open = ?result.open_ports, "Host scanned.");
        Some((host.name.clone(), result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::resolver::tests::FakeResolver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Probe double: a fixed table of open ports per host, with in-flight
    /// accounting so tests can check the pool bound. When `lookups_done` is
    /// set, its value at the first probe is kept in `lookups_at_first_probe`.
    #[derive(Default)]
    struct FakeProber {
        open: HashMap<String, Vec<u16>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        probed: Mutex<Vec<(String, u16)>>,
        delay: Duration,
        lookups_done: Option<Arc<AtomicUsize>>,
        lookups_at_first_probe: Mutex<Option<usize>>,
    }

    impl FakeProber {
        fn with_open(entries: &[(&str, &[u16])]) -> Self {
            Self {
                open: entries.iter().map(|(h, p)| (h.to_string(), p.to_vec())).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Probe for FakeProber {
        async fn probe(&self, host: &LiveHost, port: u16, _timeout: Duration) -> Option<u16> {
            if let Some(done) = &self.lookups_done {
                self.lookups_at_first_probe
                    .lock()
                    .unwrap()
                    .get_or_insert_with(|| done.load(Ordering::SeqCst));
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.probed.lock().unwrap().push((host.name.clone(), port));
            self.open
                .get(&host.name)
                .filter(|ports| ports.contains(&port))
                .map(|_| port)
        }
    }

    fn config() -> ScanConfig {
        ScanConfig::new(TargetDomain::parse("example.com").unwrap())
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn only_resolving_candidates_are_reported() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["www.example.com"]));
        let prober = Arc::new(FakeProber::with_open(&[("www.example.com", &[80, 443])]));
        let scanner = ScanOrchestrator::new(config(), resolver, prober);

        let report = scanner.run(labels(&["www", "doesnotexist123"])).await;

        assert_eq!(report.hosts.keys().collect::<Vec<_>>(), vec!["www.example.com"]);
        assert_eq!(report.hosts["www.example.com"].open_ports, vec![80, 443]);
        assert_eq!(report.candidates_checked, 2);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn live_host_without_listeners_is_still_reported() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["mail.example.com"]));
        let prober = Arc::new(FakeProber::default());
        let scanner = ScanOrchestrator::new(config(), resolver, prober);

        let before = Utc::now();
        let report = scanner.run(labels(&["mail"])).await;

        let result = &report.hosts["mail.example.com"];
        assert!(result.open_ports.is_empty());
        assert!(result.scanned_at >= before && result.scanned_at <= report.finished_at);
    }

    #[tokio::test]
    async fn empty_candidate_list_gives_empty_report() {
        let resolver = Arc::new(FakeResolver::default());
        let prober = Arc::new(FakeProber::default());
        let scanner = ScanOrchestrator::new(config(), resolver, prober);

        let report = scanner.run(Vec::new()).await;
        assert!(report.hosts.is_empty());
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn open_ports_come_from_the_port_list_once_each() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["www.example.com"]));
        // 9999 is not in the configured list and must never show up.
        let prober = Arc::new(FakeProber::with_open(&[("www.example.com", &[8080, 22, 9999, 22])]));
        let scanner = ScanOrchestrator::new(config(), resolver, Arc::clone(&prober));

        let report = scanner.run(labels(&["www", "www"])).await;

        let open = &report.hosts["www.example.com"].open_ports;
        assert_eq!(open, &vec![22, 8080]);
        assert!(open.iter().all(|p| scanner.config().ports.contains(p)));
    }

    #[tokio::test]
    async fn many_concurrent_lookups_find_every_live_host() {
        let names: Vec<String> = (0..200).map(|i| format!("h{i}.example.com")).collect();
        let live: Vec<&str> = names.iter().step_by(2).map(String::as_str).collect();
        let resolver = Arc::new(FakeResolver::with_hosts(&live));
        let mut cfg = config();
        cfg.resolve_workers = 16;
        let scanner = ScanOrchestrator::new(cfg, resolver, Arc::new(FakeProber::default()));

        let candidates: Vec<String> = (0..200).map(|i| format!("h{i}")).collect();
        let first = scanner.enumerate(candidates.clone()).await.snapshot().await;
        let second = scanner.enumerate(candidates).await.snapshot().await;

        assert_eq!(first.len(), 100);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn probe_pool_is_bounded() {
        let hosts: Vec<String> = (0..10).map(|i| format!("h{i}.example.com")).collect();
        let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
        let resolver = Arc::new(FakeResolver::with_hosts(&host_refs));
        let prober = Arc::new(FakeProber { delay: Duration::from_millis(5), ..Default::default() });
        let mut cfg = config();
        cfg.probe_workers = 3;
        let scanner = ScanOrchestrator::new(cfg, resolver, Arc::clone(&prober));

        let candidates: Vec<String> = (0..10).map(|i| format!("h{i}")).collect();
        let report = scanner.run(candidates).await;

        assert_eq!(report.hosts.len(), 10);
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(prober.probed.lock().unwrap().len(), 10 * scanner.config().ports.len());
    }

    #[tokio::test]
    async fn cancelled_run_dispatches_nothing() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["www.example.com"]));
        let prober = Arc::new(FakeProber::default());
        let token = CancellationToken::new();
        token.cancel();
        let scanner = ScanOrchestrator::new(config(), Arc::clone(&resolver), Arc::clone(&prober))
            .with_cancellation(token);

        let report = scanner.run(labels(&["www", "mail"])).await;

        assert!(report.cancelled);
        assert!(report.hosts.is_empty());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert!(prober.probed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_probing_keeps_only_sealed_hosts() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["a.example.com", "b.example.com"]));
        let prober = Arc::new(FakeProber { delay: Duration::from_millis(20), ..Default::default() });
        let token = CancellationToken::new();
        let mut cfg = config();
        cfg.probe_workers = 1;
        let scanner = ScanOrchestrator::new(cfg, resolver, Arc::clone(&prober))
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            token.cancel();
        });
        let report = scanner.run(labels(&["a", "b"])).await;
        canceller.await.unwrap();

        assert!(report.cancelled);
        // One worker, 8 ports per host, 20ms each: neither host can finish in 30ms.
        assert!(report.hosts.is_empty());
        assert!(prober.probed.lock().unwrap().len() < 16);
        assert_eq!(prober.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn progress_events_follow_the_phases() {
        let resolver = Arc::new(FakeResolver::with_hosts(&["www.example.com"]));
        let prober = Arc::new(FakeProber::with_open(&[("www.example.com", &[443])]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scanner = ScanOrchestrator::new(config(), resolver, prober).with_events(tx);

        scanner.run(labels(&["www", "ftp"])).await;
        drop(scanner);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.first(), Some(&ScanEvent::EnumerationStarted { candidates: 2 }));
        let probing_at = events
            .iter()
            .position(|e| *e == ScanEvent::ProbingStarted { hosts: 1 })
            .unwrap();
        let resolved = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::CandidateResolved { .. }))
            .count();
        assert_eq!(resolved, 2);
        assert!(events[..probing_at].iter().all(|e| !matches!(e, ScanEvent::HostSealed { .. })));
        assert_eq!(
            events.last(),
            Some(&ScanEvent::HostSealed { host: "www.example.com".into(), open_ports: vec![443] })
        );
    }

    #[tokio::test]
    async fn probing_waits_for_every_lookup() {
        let live: Vec<String> = (0..5).map(|i| format!("up{i}.example.com")).collect();
        let slow: Vec<String> = (0..15).map(|i| format!("slow{i}.example.com")).collect();
        let live_refs: Vec<&str> = live.iter().map(String::as_str).collect();
        let slow_refs: Vec<&str> = slow.iter().map(String::as_str).collect();
        // Live names answer at once; the misses straggle in afterwards.
        let resolver = Arc::new(FakeResolver::with_hosts(&live_refs).slow_for(&slow_refs, Duration::from_millis(20)));
        let prober = Arc::new(FakeProber {
            lookups_done: Some(Arc::clone(&resolver.completed)),
            ..Default::default()
        });
        let mut cfg = config();
        cfg.resolve_workers = 4;
        let scanner = ScanOrchestrator::new(cfg, Arc::clone(&resolver), Arc::clone(&prober));

        let candidates: Vec<String> = (0..5)
            .map(|i| format!("up{i}"))
            .chain((0..15).map(|i| format!("slow{i}")))
            .collect();
        let report = scanner.run(candidates).await;

        assert_eq!(report.hosts.len(), 5);
        assert_eq!(*prober.lookups_at_first_probe.lock().unwrap(), Some(20));
        let peak = resolver.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 4, "peak of {peak} concurrent lookups");
        assert_eq!(resolver.in_flight.load(Ordering::SeqCst), 0);
    }
}

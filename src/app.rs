// src/app.rs

use crate::core::models::{PortResult, ScanEvent, ScanReport};
use crate::core::report;
use crate::logging;
use ratatui::widgets::{ListState, ScrollbarState};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How many log lines the log panel keeps.
const LOG_TAIL_LINES: usize = 200;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    #[default]
    Enumerating,
    Probing,
}

/// Live counters fed by the orchestrator's progress events.
#[derive(Debug, Default)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    pub candidates_total: usize,
    pub candidates_done: usize,
    pub live_found: usize,
    pub hosts_total: usize,
    pub hosts_done: usize,
}

impl ScanProgress {
    /// Overall completion: enumeration fills the first half, probing the second.
    pub fn percent(&self) -> u16 {
        fn ratio(done: usize, total: usize) -> f64 {
            if total == 0 { 1.0 } else { (done as f64 / total as f64).min(1.0) }
        }
        let value = match self.phase {
            ScanPhase::Enumerating => 0.5 * ratio(self.candidates_done, self.candidates_total),
            ScanPhase::Probing => 0.5 + 0.5 * ratio(self.hosts_done, self.hosts_total),
        };
        (value * 100.0).round() as u16
    }
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub candidates_checked: usize,
    pub live_hosts: usize,
    pub exposed_hosts: usize,
    pub open_ports: usize,
    pub duration_secs: i64,
    /// `(port, hosts with it open)`, most common first.
    pub top_ports: Vec<(u16, usize)>,
    pub cancelled: bool,
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub state: AppState,
    pub input: String,
    pub input_error: Option<String>,
    pub target: Option<String>,
    pub scan_report: Option<ScanReport>,
    pub summary: ScanSummary,
    pub progress: ScanProgress,
    pub host_list_state: ListState,
    pub spinner_frame: usize,
    pub show_logs: bool,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub output_dir: PathBuf,
    pub cancel_token: Option<CancellationToken>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            state: AppState::Idle,
            input: String::new(),
            input_error: None,
            target: None,
            scan_report: None,
            summary: ScanSummary::default(),
            progress: ScanProgress::default(),
            host_list_state: ListState::default(),
            spinner_frame: 0,
            show_logs: false,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            output_dir: PathBuf::from("."),
            cancel_token: None,
        }
    }

    pub fn on_tick(&mut self) {
        if let AppState::Scanning = self.state {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if self.show_logs {
            self.log_content = logging::read_log_tail(LOG_TAIL_LINES);
        }
    }

    /// Switches to the scanning state for `target`.
    pub fn begin_scan(&mut self, target: String, token: CancellationToken, output_dir: PathBuf) {
        self.state = AppState::Scanning;
        self.input_error = None;
        self.target = Some(target);
        self.progress = ScanProgress::default();
        self.cancel_token = Some(token);
        self.output_dir = output_dir;
    }

    pub fn apply_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::EnumerationStarted { candidates } => {
                self.progress.phase = ScanPhase::Enumerating;
                self.progress.candidates_total = candidates;
            }
            ScanEvent::CandidateResolved { live, .. } => {
                self.progress.candidates_done += 1;
                if live {
                    self.progress.live_found += 1;
                }
            }
            ScanEvent::ProbingStarted { hosts } => {
                self.progress.phase = ScanPhase::Probing;
                self.progress.hosts_total = hosts;
            }
            ScanEvent::HostSealed { .. } => {
                self.progress.hosts_done += 1;
            }
        }
    }

    pub fn finish_scan(&mut self, report: ScanReport) {
        self.scan_report = Some(report);
        self.state = AppState::Finished;
        self.cancel_token = None;
        self.host_list_state = ListState::default();
        if !self.host_names().is_empty() {
            self.host_list_state.select(Some(0));
        }
        self.update_summary();
    }

    /// Asks the running scan to stop dispatching work. The partial report
    /// still arrives through the normal channel.
    pub fn cancel_scan(&mut self) {
        if let Some(token) = &self.cancel_token {
            info!("Cancelling scan on user request.");
            token.cancel();
        }
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancel_token.as_ref().is_some_and(|t| t.is_cancelled())
    }

    pub fn update_summary(&mut self) {
        if let Some(report) = &self.scan_report {
            let mut top_ports: Vec<(u16, usize)> = report.port_histogram().into_iter().collect();
            top_ports.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            self.summary = ScanSummary {
                candidates_checked: report.candidates_checked,
                live_hosts: report.hosts.len(),
                exposed_hosts: report.hosts_with_open_ports(),
                open_ports: report.total_open_ports(),
                duration_secs: (report.finished_at - report.started_at).num_seconds(),
                top_ports,
                cancelled: report.cancelled,
            };
        }
    }

    pub fn host_names(&self) -> Vec<&str> {
        self.scan_report
            .as_ref()
            .map(|r| r.hosts.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn selected_host(&self) -> Option<(&str, &PortResult)> {
        let report = self.scan_report.as_ref()?;
        let index = self.host_list_state.selected()?;
        report.hosts.iter().nth(index).map(|(name, result)| (name.as_str(), result))
    }

    pub fn select_next(&mut self) {
        let count = self.host_names().len();
        if count == 0 {
            return;
        }
        let next = match self.host_list_state.selected() {
            Some(i) if i + 1 < count => i + 1,
            _ => 0,
        };
        self.host_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let count = self.host_names().len();
        if count == 0 {
            return;
        }
        let previous = match self.host_list_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.host_list_state.select(Some(previous));
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.log_content = logging::read_log_tail(LOG_TAIL_LINES);
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    /// Writes the finished report in every format to the output directory.
    pub fn export(&mut self) {
        let Some(report) = &self.scan_report else {
            return;
        };
        self.export_status = match report::save_all(report, &self.output_dir) {
            Ok(paths) => {
                let stem = report::artifact_stem(report);
                info!(files = paths.len(), "Exported scan report.");
                ExportStatus::Success(format!("Saved {stem}.{{json,csv,md}}"))
            }
            Err(e) => {
                warn!(error = %e, "Export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn quit(&mut self) {
        self.cancel_scan();
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.input_error = None;
        self.target = None;
        self.scan_report = None;
        self.summary = ScanSummary::default();
        self.progress = ScanProgress::default();
        self.host_list_state = ListState::default();
        self.export_status = ExportStatus::Idle;
        self.cancel_token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn report(hosts: &[(&str, &[u16])]) -> ScanReport {
        let now = Utc::now();
        ScanReport {
            target: "example.com".into(),
            started_at: now,
            finished_at: now,
            candidates_checked: 6,
            cancelled: false,
            hosts: hosts
                .iter()
                .map(|(h, p)| {
                    (h.to_string(), PortResult { open_ports: p.to_vec(), scanned_at: now, addresses: vec![] })
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn progress_tracks_both_phases() {
        let mut app = App::new();
        app.apply_event(ScanEvent::EnumerationStarted { candidates: 4 });
        app.apply_event(ScanEvent::CandidateResolved { host: "a.example.com".into(), live: true });
        app.apply_event(ScanEvent::CandidateResolved { host: "b.example.com".into(), live: false });
        assert_eq!(app.progress.percent(), 25);
        assert_eq!(app.progress.live_found, 1);

        app.apply_event(ScanEvent::ProbingStarted { hosts: 2 });
        app.apply_event(ScanEvent::HostSealed { host: "a.example.com".into(), open_ports: vec![] });
        assert_eq!(app.progress.percent(), 75);
    }

    #[test]
    fn empty_phases_count_as_done() {
        let progress = ScanProgress { phase: ScanPhase::Probing, ..Default::default() };
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn finishing_selects_the_first_host_and_summarizes() {
        let mut app = App::new();
        app.finish_scan(report(&[("b.example.com", &[443]), ("a.example.com", &[22, 443]), ("c.example.com", &[])]));

        assert_eq!(app.selected_host().map(|(name, _)| name), Some("a.example.com"));
        assert_eq!(app.summary.live_hosts, 3);
        assert_eq!(app.summary.exposed_hosts, 2);
        assert_eq!(app.summary.open_ports, 3);
        assert_eq!(app.summary.top_ports.first(), Some(&(443, 2)));
    }

    #[test]
    fn selection_wraps_around() {
        let mut app = App::new();
        app.finish_scan(report(&[("a.example.com", &[]), ("b.example.com", &[])]));

        app.select_previous();
        assert_eq!(app.selected_host().map(|(name, _)| name), Some("b.example.com"));
        app.select_next();
        assert_eq!(app.selected_host().map(|(name, _)| name), Some("a.example.com"));
    }

    #[test]
    fn cancel_and_reset() {
        let mut app = App::new();
        let token = CancellationToken::new();
        app.begin_scan("example.com".into(), token.clone(), PathBuf::from("."));
        app.cancel_scan();
        assert!(token.is_cancelled());
        assert!(app.is_cancelling());

        app.finish_scan(report(&[]));
        app.reset();
        assert!(matches!(app.state, AppState::Idle));
        assert!(app.scan_report.is_none());
        assert!(app.selected_host().is_none());
    }

    #[test]
    fn export_writes_into_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new();
        app.begin_scan("example.com".into(), CancellationToken::new(), dir.path().to_path_buf());
        app.finish_scan(report(&[("www.example.com", &[80])]));

        app.export();

        assert!(matches!(app.export_status, ExportStatus::Success(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}

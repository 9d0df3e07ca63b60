// src/ui/widgets/summary.rs

use crate::app::{App, AppState, ScanPhase};
use crate::core::knowledge_base;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Renders the summary panel.
///
/// While a scan runs it shows the phase, a progress gauge and live counters;
/// once finished it shows the run statistics and the most common open ports.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Target & phase
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Spacer
            Constraint::Length(6), // Counters
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Top ports
        ])
        .split(area);

    if matches!(app.state, AppState::Idle) {
        return;
    }

    // --- Target & Phase ---
    let target = app.target.as_deref().unwrap_or("-");
    let (status, status_style) = match app.state {
        AppState::Scanning if app.is_cancelling() => ("Cancelling", Style::default().fg(Color::Yellow)),
        AppState::Scanning => match app.progress.phase {
            ScanPhase::Enumerating => ("Resolving", Style::default().fg(Color::Cyan)),
            ScanPhase::Probing => ("Probing ports", Style::default().fg(Color::Cyan)),
        },
        _ if app.summary.cancelled => ("Cancelled (partial)", Style::default().fg(Color::Yellow)),
        _ => ("Complete", Style::default().fg(Color::Green)),
    };
    let header = Text::from(vec![
        Line::from(target.bold()),
        Line::from(Span::styled(status, status_style)),
    ]);
    frame.render_widget(Paragraph::new(header).alignment(Alignment::Center), summary_chunks[0]);

    // --- Gauge ---
    let percent = match app.state {
        AppState::Finished => 100,
        _ => app.progress.percent().min(100),
    };
    let gauge = Gauge::default()
        .percent(percent)
        .label(format!("{percent}%"))
        .style(Style::default().fg(if percent >= 100 { Color::Green } else { Color::Cyan }));
    frame.render_widget(gauge, summary_chunks[1]);

    // --- Counters ---
    let counters = if let AppState::Finished = app.state {
        vec![
            counter_line("Candidates", app.summary.candidates_checked, Color::White),
            counter_line("Live hosts", app.summary.live_hosts, Color::Cyan),
            counter_line("Hosts w/ open ports", app.summary.exposed_hosts, Color::Yellow),
            counter_line("Open ports", app.summary.open_ports, Color::Green),
            Line::from(vec![
                Span::raw("Duration: "),
                Span::styled(format!("{}s", app.summary.duration_secs), Style::default().fg(Color::White)),
            ]),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::raw("Resolved: "),
                Span::styled(
                    format!("{}/{}", app.progress.candidates_done, app.progress.candidates_total),
                    Style::default().fg(Color::White),
                ),
            ]),
            counter_line("Live so far", app.progress.live_found, Color::Cyan),
            Line::from(vec![
                Span::raw("Hosts scanned: "),
                Span::styled(
                    format!("{}/{}", app.progress.hosts_done, app.progress.hosts_total),
                    Style::default().fg(Color::White),
                ),
            ]),
        ]
    };
    let counters_block = Block::default().title("RESULTS".bold());
    frame.render_widget(Paragraph::new(counters).block(counters_block), summary_chunks[3]);

    // --- Top Ports ---
    if !matches!(app.state, AppState::Finished) {
        return;
    }
    let ports_block = Block::default().title("OPEN PORTS".bold());
    let mut port_lines = Vec::new();
    if app.summary.top_ports.is_empty() {
        port_lines.push(Line::from("None found."));
    }
    for (port, hosts) in &app.summary.top_ports {
        port_lines.push(Line::from(vec![
            Span::styled(format!("{port:>5} "), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:<9}", knowledge_base::service_name(*port))),
            Span::styled(format!("{hosts} host(s)"), Style::default().fg(Color::DarkGray)),
        ]));
    }
    frame.render_widget(Paragraph::new(port_lines).block(ports_block), summary_chunks[5]);
}

fn counter_line(label: &'static str, value: usize, colour: Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(value.to_string(), Style::default().fg(colour)),
    ])
}

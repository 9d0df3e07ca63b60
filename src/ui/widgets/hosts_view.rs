// src/ui/widgets/hosts_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base::{self, ServiceCategory};
use crate::core::models::PortResult;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn render_hosts_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Live Hosts (Navigate with ↑ ↓)");

    if !matches!(app.state, AppState::Finished) {
        let content = match app.state {
            AppState::Idle => Paragraph::new("Enter a domain and press Enter. Live subdomains will appear here...")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            AppState::Scanning => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame % SPINNER_CHARS.len()];
                let phase = match app.progress.phase {
                    crate::app::ScanPhase::Enumerating => "Resolving subdomains",
                    crate::app::ScanPhase::Probing => "Probing ports",
                };
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                    Span::raw(format!("{phase}... Please wait.")),
                ]))
                .alignment(Alignment::Center)
            }
            _ => Paragraph::new(""),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .scan_report
        .iter()
        .flat_map(|report| report.hosts.iter())
        .map(|(name, result)| {
            let (badge, style) = if result.open_ports.is_empty() {
                ("  -  ".to_string(), Style::default().fg(Color::DarkGray))
            } else {
                (format!("{:>3} ", result.open_ports.len()), Style::default().fg(Color::Green))
            };
            ListItem::new(Line::from(vec![
                Span::styled(badge, style),
                Span::raw(name.clone()),
            ]))
        })
        .collect();

    let detail_block = Block::default().borders(Borders::TOP).title("Details");

    if items.is_empty() {
        render_placeholder_details(frame, app, detail_block, inner_area);
        return;
    }

    let hosts_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(hosts_list, chunks[0], &mut app.host_list_state);

    match app.selected_host() {
        Some((name, result)) => {
            let p = Paragraph::new(host_details(name, result))
                .wrap(Wrap { trim: true })
                .block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn host_details<'a>(name: &'a str, result: &'a PortResult) -> Text<'a> {
    let mut lines = vec![
        Line::from(name.bold()),
        Line::from(vec![
            Span::styled("Scanned at: ", Style::default().fg(Color::DarkGray)),
            Span::raw(result.scanned_at.to_rfc3339()),
        ]),
    ];
    if !result.addresses.is_empty() {
        let addresses: Vec<String> = result.addresses.iter().map(|a| a.to_string()).collect();
        lines.push(Line::from(vec![
            Span::styled("Addresses:  ", Style::default().fg(Color::DarkGray)),
            Span::raw(addresses.join(", ")),
        ]));
    }
    lines.push(Line::from(""));

    if result.open_ports.is_empty() {
        lines.push(Line::from("No open ports among the common ports.".fg(Color::DarkGray)));
        return Text::from(lines);
    }

    lines.push(Line::from("OPEN PORTS:".yellow().bold()));
    for port in &result.open_ports {
        let Some(detail) = knowledge_base::get_service_detail(*port) else {
            lines.push(Line::from(format!("{port:>5}  {}", knowledge_base::service_name(*port))));
            continue;
        };
        let colour = match (detail.category, detail.cleartext) {
            (ServiceCategory::RemoteAccess, true) => Color::Red,
            (_, true) => Color::Yellow,
            _ => Color::Green,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{port:>5}  {:<9}", detail.service), Style::default().fg(colour).bold()),
            Span::styled(format!("[{}] ", detail.category), Style::default().fg(Color::DarkGray)),
            Span::raw(detail.description),
        ]));
    }
    Text::from(lines)
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let placeholder_text = if app.summary.live_hosts == 0 {
        Text::from(vec![
            Line::from(""),
            Line::from("NO LIVE SUBDOMAINS".bold().fg(Color::Yellow)),
            Line::from(""),
            Line::from("None of the candidate names resolved."),
            Line::from("Try a larger wordlist (SUBSCAN_RS_WORDLIST)."),
        ])
    } else {
        Text::from("Select a host above to see its open ports.")
    };

    let p = Paragraph::new(placeholder_text).alignment(Alignment::Center).block(block);
    frame.render_widget(p, area);
}

// src/ui/widgets/footer.rs

use crate::app::{App, AppState, ExportStatus};
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer widget, which displays available actions.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.show_disclaimer {
        Line::from(vec![key("Enter"), Span::raw(" to continue, "), key("Esc"), Span::raw(" to quit.")])
    } else {
        match app.state {
            AppState::Idle => Line::from(vec![
                Span::raw("Press "),
                key("Enter"),
                Span::raw(" to scan, "),
                key("Tab"),
                Span::raw(" for logs, "),
                key("Esc"),
                Span::raw(" to quit."),
            ]),
            AppState::Scanning if app.is_cancelling() => {
                Line::from("Cancelling... waiting for in-flight probes to finish.")
            }
            AppState::Scanning => Line::from(vec![
                Span::raw("Scanning... "),
                key("Esc"),
                Span::raw(" to cancel, "),
                key("Q"),
                Span::raw(" to quit."),
            ]),
            AppState::Finished => match &app.export_status {
                ExportStatus::Success(message) => Line::from(message.as_str()).green(),
                ExportStatus::Error(message) => Line::from(format!("Export failed: {message}")).red(),
                ExportStatus::Idle => Line::from(vec![
                    key("[N]"),
                    Span::raw("ew Scan, "),
                    key("[E]"),
                    Span::raw("xport, "),
                    key("[Tab]"),
                    Span::raw(" Logs, "),
                    key("[Q]"),
                    Span::raw("uit"),
                ]),
            },
        }
    };

    let footer = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

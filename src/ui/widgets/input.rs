// src/ui/widgets/input.rs
use ratatui::{prelude::*, widgets::{Block, Borders, Paragraph}};
use crate::app::{App, AppState};

/// Renders the input box widget. A configuration error, if any, replaces the
/// title so it stays visible while the user edits the target.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_block = match &app.input_error {
        Some(error) => Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Line::from(format!("Target Domain: {error}")).red()),
        None => Block::default().borders(Borders::ALL).title("Target Domain"),
    };

    let text = match (&app.state, &app.target) {
        (AppState::Idle, _) | (_, None) => app.input.as_str(),
        (_, Some(target)) => target.as_str(),
    };
    let input_paragraph = Paragraph::new(text)
        .block(input_block)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_paragraph, area);

    // Show the cursor only while typing.
    if let AppState::Idle = app.state {
        if !app.show_disclaimer {
            frame.set_cursor_position(cursor_position(area, &app.input));
        }
    }
}

/// Cursor just after the typed text, inside the border. Saturates instead of
/// wrapping when the input is longer than any terminal is wide.
fn cursor_position(area: Rect, input: &str) -> (u16, u16) {
    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    (area.x.saturating_add(typed).saturating_add(1), area.y.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_the_typed_text() {
        let area = Rect::new(2, 5, 40, 3);
        assert_eq!(cursor_position(area, ""), (3, 6));
        assert_eq!(cursor_position(area, "exämple"), (10, 6));
    }

    #[test]
    fn huge_paste_does_not_overflow_the_cursor() {
        let area = Rect::new(10, 0, 40, 3);
        let pasted = "a".repeat(70_000);
        assert_eq!(cursor_position(area, &pasted), (u16::MAX, 1));
    }
}

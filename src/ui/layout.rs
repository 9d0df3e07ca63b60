// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen areas of the application, computed once per frame.
pub struct AppLayout {
    pub input: Rect,
    pub hosts: Rect,
    pub summary: Rect,
    pub footer: Rect,
    pub log_panel: Rect,
}

/// Splits the frame into the input box on top, the content row in the middle
/// and a one-line footer.
///
/// The content row holds the host list and the summary side by side, plus
/// the log panel on the right when `show_logs` is set.
pub fn create_layout(frame_size: Rect, show_logs: bool) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_constraints = if show_logs {
        vec![Constraint::Percentage(45), Constraint::Percentage(25), Constraint::Percentage(30)]
    } else {
        vec![Constraint::Percentage(65), Constraint::Percentage(35)]
    };

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(content_constraints)
        .split(main_chunks[1]);

    AppLayout {
        input: main_chunks[0],
        hosts: content_chunks[0],
        summary: content_chunks[1],
        log_panel: if show_logs { content_chunks[2] } else { Rect::default() },
        footer: main_chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_panel_only_when_requested() {
        let area = Rect::new(0, 0, 120, 40);

        let without = create_layout(area, false);
        assert_eq!(without.log_panel, Rect::default());
        assert_eq!(without.input.height, 3);
        assert_eq!(without.footer.y, 39);

        let with = create_layout(area, true);
        assert!(with.log_panel.width > 0);
        assert!(with.hosts.width < without.hosts.width);
    }
}

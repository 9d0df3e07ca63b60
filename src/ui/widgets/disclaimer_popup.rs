// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Renders the authorization notice on top of the existing UI.
///
/// Shown once at startup; the user has to acknowledge it before the input box
/// accepts a target.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("AUTHORIZED USE ONLY".bold().yellow()),
        Line::from(""),
        Line::from("subscan-rs resolves candidate subdomains of a target and opens TCP connections to every host it finds."),
        Line::from(""),
        Line::from("Only scan domains you own or have explicit, written permission to test. Unauthorized scanning may be illegal in your jurisdiction."),
        Line::from(""),
        Line::from("Port probes are plain TCP connects and will show up in the target's logs."),
        Line::from(""),
        Line::from("Wildcard DNS zones are not detected: every candidate will look live.".dark_gray()),
        Line::from(""),
        Line::from("Press ".bold() + "Enter".bold().yellow() + " to acknowledge and continue".bold()),
    ]);

    let block = Block::default()
        .title("Disclaimer")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let popup_area = centered_rect(60, 50, area);

    let popup = Paragraph::new(disclaimer_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    // Clear first so the UI underneath does not bleed through.
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// A rectangle of the given percentage size, centered in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered_inside_the_frame() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 10);
    }
}

use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 54, 34);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Navigation"),
            Self::key_line("j/↓ k/↑", "Move down / up"),
            Self::key_line("g / G", "Go to top / bottom"),
            Self::key_line("Tab", "Next resource kind"),
            Self::key_line("S-Tab", "Previous resource kind"),
            Self::key_line("n", "Pick namespace"),
            Self::key_line("c", "Pick cluster"),
            Line::from(""),
            Self::section("Table"),
            Self::key_line("/", "Search"),
            Self::key_line("f", "Cycle status filter"),
            Self::key_line("1-9", "Sort by column"),
            Self::key_line("Ctrl+r", "Refresh"),
            Line::from(""),
            Self::section("Selection"),
            Self::key_line("Space", "Toggle row"),
            Self::key_line("a", "Toggle all visible rows"),
            Self::key_line("x", "Clear selection"),
            Self::key_line("D", "Delete selected"),
            Self::key_line("R", "Restart selected"),
            Self::key_line("L", "Label selected"),
            Line::from(""),
            Self::section("Row actions"),
            Self::key_line("d / r", "Delete / restart row"),
            Line::from(""),
            Self::section("General"),
            Self::key_line("A", "Audit log"),
            Self::key_line("Ctrl+n", "Dismiss notification"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Go back"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>9}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}

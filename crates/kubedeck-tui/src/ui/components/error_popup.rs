use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Blocking error message; any key dismisses it
pub struct ErrorPopup<'a> {
    message: &'a str,
}

impl<'a> ErrorPopup<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    pub fn render(self, frame: &mut Frame) {
        let area = Layout::popup(frame.area(), 60, 7);
        frame.render_widget(Clear, area);

        let text = vec![
            Line::from(Span::styled(self.message, Theme::text())),
            Line::from(""),
            Line::from(Span::styled("Press any key to dismiss", Theme::text_dim())),
        ];
        let popup = Paragraph::new(text).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::error())
                .title(Span::styled(" Error ", Theme::error())),
        );
        frame.render_widget(popup, area);
    }
}

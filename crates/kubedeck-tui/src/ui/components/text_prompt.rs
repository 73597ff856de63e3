use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

/// Single-line input popup
pub struct TextPrompt<'a> {
    title: &'a str,
    input: &'a str,
    hint: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> TextPrompt<'a> {
    pub fn new(title: &'a str, input: &'a str) -> Self {
        Self {
            title,
            input,
            hint: None,
            error: None,
        }
    }

    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let area = Layout::popup(frame.area(), 60, 7);
        frame.render_widget(Clear, area);

        let mut lines = vec![Line::from(vec![
            Span::styled("> ", Theme::text_highlight()),
            Span::styled(self.input, Theme::text()),
            Span::styled("█", Theme::text_dim()),
        ])];
        if let Some(hint) = self.hint {
            lines.push(Line::from(Span::styled(hint, Theme::text_dim())));
        }
        if let Some(error) = self.error {
            lines.push(Line::from(Span::styled(error, Theme::error())));
        }

        let prompt = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(format!(" {} ", self.title), Theme::title())),
        );
        frame.render_widget(prompt, area);
    }
}

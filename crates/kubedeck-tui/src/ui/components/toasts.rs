use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use kubedeck_console::{Notice, NoticeLevel};

use crate::ui::Theme;

const MAX_TOASTS: usize = 4;

/// Notifications stacked in the bottom-right corner, newest at the bottom
pub struct Toasts<'a> {
    notices: &'a [Notice],
}

impl<'a> Toasts<'a> {
    pub fn new(notices: &'a [Notice]) -> Self {
        Self { notices }
    }

    pub fn render(self, frame: &mut Frame) {
        let area = frame.area();
        let shown = &self.notices[self.notices.len().saturating_sub(MAX_TOASTS)..];

        // Above the status bar
        let mut bottom = area.bottom().saturating_sub(1);
        for notice in shown.iter().rev() {
            let text = format!("{} {}", icon(notice.level), notice.message);
            let width = (text.width() as u16 + 4).min(area.width.saturating_sub(2)).max(10);
            if bottom < area.y + 3 {
                break;
            }
            let rect = Rect::new(
                area.right().saturating_sub(width + 1),
                bottom - 3,
                width,
                3,
            );
            bottom -= 3;

            let style = Theme::notice(notice.level);
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(text, style)))
                    .block(Block::default().borders(Borders::ALL).border_style(style)),
                rect,
            );
        }
    }
}

fn icon(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Pending => "…",
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
    }
}

use ratatui::{
    Frame,
    layout::Alignment,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use kubedeck_console::{ConfirmPhase, ConfirmVariant, Prompt};

use crate::ui::{Layout, Theme};

/// Modal confirmation for destructive actions
pub struct ConfirmDialog<'a> {
    prompt: &'a Prompt,
    phase: ConfirmPhase,
    force: bool,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(prompt: &'a Prompt, phase: ConfirmPhase, force: bool) -> Self {
        Self {
            prompt,
            phase,
            force,
        }
    }

    pub fn render(self, frame: &mut Frame) {
        let area = Layout::popup(frame.area(), 60, 10);
        frame.render_widget(Clear, area);

        let border = Theme::confirm_border(self.prompt.variant);
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(self.prompt.description.as_str(), Theme::text())),
            Line::from(""),
        ];

        if self.prompt.show_force_option {
            let checkbox = if self.force { "[x]" } else { "[ ]" };
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", checkbox), Theme::checked()),
                Span::styled("Force (skip graceful termination)", Theme::text()),
                Span::styled("  f", Theme::text_dim()),
            ]));
            lines.push(Line::from(""));
        }

        let confirm_label = match self.prompt.variant {
            ConfirmVariant::Danger => "Delete",
            ConfirmVariant::Warning => "Confirm",
        };
        lines.push(if self.phase == ConfirmPhase::Confirming {
            Line::from(Span::styled("Working...", Theme::text_highlight()))
        } else {
            Line::from(vec![
                Span::styled("[Enter/y] ", Theme::text_highlight()),
                Span::styled(confirm_label, border.add_modifier(Modifier::BOLD)),
                Span::styled("   [Esc/n] ", Theme::text_highlight()),
                Span::styled("Cancel", Theme::text()),
            ])
        });

        let dialog = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(Span::styled(
                        format!(" {} ", self.prompt.title),
                        border.add_modifier(Modifier::BOLD),
                    )),
            );

        frame.render_widget(dialog, area);
    }
}

use chrono::Local;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use kubedeck_console::{AuditEntry, AuditOutcome};

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{StatusBar, list_nav_hints},
    },
};

/// Record of destructive operations run in this session, newest first
pub struct AuditLogScreen;

impl AuditLogScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled("kubedeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Audit Log", Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.session.user().name.as_str(), Theme::text_highlight()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, header_area);

        Self::render_entries(frame, content_area, state);

        let status = StatusBar::new()
            .hints(list_nav_hints().into_iter().filter(|(key, _)| *key != "Enter"))
            .right(format!("{} entries", state.audit.len()));
        frame.render_widget(status, status_area);
    }

    fn render_entries(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let mut entries = state.audit.all();
        entries.reverse();

        let items: Vec<ListItem> = if entries.is_empty() {
            vec![ListItem::new(Span::styled(
                "No operations recorded yet",
                Theme::text_dim(),
            ))]
        } else {
            entries.iter().map(|e| ListItem::new(entry_line(e))).collect()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border_focused())
                    .title(Span::styled(" Operations ", Theme::title())),
            )
            .highlight_style(Theme::list_item_selected());

        frame.render_stateful_widget(list, area, &mut state.ui_state.list_state);
    }
}

fn entry_line(entry: &AuditEntry) -> Line<'static> {
    let outcome_style = match entry.outcome {
        AuditOutcome::Succeeded => Style::default().fg(Theme::SUCCESS),
        AuditOutcome::Partial { .. } => Style::default().fg(Theme::WARNING),
        AuditOutcome::Failed(_) => Style::default().fg(Theme::ERROR),
    };
    let scope = match (&entry.cluster_id, &entry.namespace) {
        (Some(id), Some(ns)) => format!("{}/{}", id, ns),
        (Some(id), None) => id.to_string(),
        _ => "-".to_string(),
    };

    Line::from(vec![
        Span::styled(
            entry.at.with_timezone(&Local).format("%H:%M:%S ").to_string(),
            Theme::text_dim(),
        ),
        Span::styled(format!("{:<10}", entry.user), Theme::text_highlight()),
        Span::styled(format!("{:<8}", entry.verb), Theme::text()),
        Span::styled(format!("{:<16}", entry.resource), Theme::text()),
        Span::styled(format!("{:<14}", scope), Theme::text_dim()),
        Span::styled(format!("{:<14}", entry.outcome.label()), outcome_style),
        Span::styled(entry.targets.join(", "), Theme::text()),
    ])
}

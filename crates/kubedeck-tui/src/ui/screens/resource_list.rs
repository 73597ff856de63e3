use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use kubedeck_console::{ColumnView, ConsoleStatus, RowView};

use crate::{
    app::{AppState, InputMode},
    ui::{
        Layout, Theme,
        components::{StatusBar, resource_list_hints},
    },
};

/// Table of one resource kind with selection, row actions and batch hints
pub struct ResourceListScreen;

impl ResourceListScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);
        let (filter_area, table_area, message_area) = Layout::resource_list(content_area);

        Self::render_header(frame, header_area, state);
        Self::render_filter_bar(frame, filter_area, state);
        Self::render_table(frame, table_area, state);
        Self::render_message(frame, message_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let cluster = state
            .current_cluster()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "no cluster".to_string());
        let scope = state.console.scope();
        let namespace = match (&scope.namespace, state.console.namespace_required()) {
            (Some(ns), _) => ns.clone(),
            (None, true) => "-".to_string(),
            (None, false) => "all namespaces".to_string(),
        };

        let mut title = vec![
            Span::styled("kubedeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(cluster, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(namespace, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.console.title().to_string(), Theme::title()),
        ];
        if state.console.is_loading() {
            title.push(Span::styled("  loading…", Theme::text_dim()));
        }

        let header = Paragraph::new(Line::from(title)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let searching = state.ui_state.input_mode == InputMode::Search;
        let search = if searching {
            state.ui_state.search_input.as_str()
        } else {
            state.console.search()
        };

        let shown = if search.is_empty() && !searching {
            "-"
        } else {
            search
        };
        let style = if searching {
            Theme::text_highlight()
        } else {
            Theme::text()
        };

        let mut spans = vec![
            Span::styled(" Search: ", Theme::text_dim()),
            Span::styled(shown.to_string(), style),
        ];
        if searching {
            spans.push(Span::styled("█", Theme::text_dim()));
        }
        if let Some((field, filter)) = state.console.status_filter() {
            spans.push(Span::styled(format!("   {}: ", field), Theme::text_dim()));
            spans.push(Span::styled(filter.label().to_string(), Theme::text_highlight()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_table(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(
                format!(
                    " {} ({}/{}) ",
                    state.console.title(),
                    state.console.visible_len(),
                    state.console.total_len()
                ),
                Theme::title(),
            ));

        let status = state.console.status();
        if status != ConsoleStatus::Ready {
            let message = match status {
                ConsoleStatus::ClusterRequired => {
                    "Select a cluster to continue. Press c to pick one."
                }
                ConsoleStatus::NamespaceRequired => "Select a namespace. Press n to pick one.",
                other => other.message(),
            };
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(message, Theme::text_dim())),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let columns = state.console.columns();
        let rows = state.console.rows();

        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(columns.iter().map(|c| Cell::from(header_text(c))))
                .chain(std::iter::once(Cell::from("ACTIONS"))),
        )
        .style(Theme::table_header());

        let table = Table::new(rows.iter().map(table_row), widths(&columns))
            .header(header)
            .block(block)
            .row_highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(table, area, &mut state.ui_state.table_state);
    }

    fn render_message(frame: &mut Frame, area: Rect, state: &AppState) {
        let line = if let Some(err) = state.console.last_error() {
            Line::from(Span::styled(format!(" {}", err), Theme::error()))
        } else {
            match state.console.selected_count() {
                0 => Line::from(""),
                n => Line::from(vec![
                    Span::styled(format!(" {} selected", n), Theme::text_highlight()),
                    Span::styled("  (x to clear)", Theme::text_dim()),
                ]),
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let hints = resource_list_hints(
            state.console.batch_support(),
            state.console.selected_count(),
        );
        let status = StatusBar::new()
            .hints(hints)
            .right(state.session.user().name.clone());
        frame.render_widget(status, area);
    }
}

fn header_text(column: &ColumnView) -> String {
    match column.sorted {
        Some(true) => format!("{} ▼", column.header),
        Some(false) => format!("{} ▲", column.header),
        None => column.header.to_string(),
    }
}

fn widths(columns: &[ColumnView]) -> Vec<Constraint> {
    std::iter::once(Constraint::Length(3))
        .chain(columns.iter().map(|c| match c.width {
            0 => Constraint::Min(12),
            w => Constraint::Length(w),
        }))
        .chain(std::iter::once(Constraint::Length(16)))
        .collect()
}

fn table_row(row: &RowView) -> Row<'static> {
    let checkbox = if row.selected {
        Cell::from(Span::styled("[x]", Theme::checked()))
    } else {
        Cell::from(Span::styled("[ ]", Theme::text_dim()))
    };

    let controls: Vec<Span> = row
        .controls
        .iter()
        .flat_map(|control| {
            let label = match control.hotkey {
                Some(key) => format!("{}{}", key, control.icon),
                None => control.icon.to_string(),
            };
            [
                Span::styled(label, Theme::control(control.danger, control.enabled)),
                Span::raw(" "),
            ]
        })
        .collect();

    let mut style = Theme::tone(row.tone);
    if row.selected {
        style = style.add_modifier(Modifier::BOLD);
    }

    Row::new(
        std::iter::once(checkbox)
            .chain(row.cells.iter().map(|c| Cell::from(c.clone())))
            .chain(std::iter::once(Cell::from(Line::from(controls)))),
    )
    .style(style)
}

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{ListSelector, ListSelectorExt, StatusBar, list_nav_hints},
    },
};

/// Cluster selection screen
pub struct ClusterSelectScreen;

impl ClusterSelectScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);

        Self::render_header(frame, header_area, state);
        Self::render_list(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut title = vec![
            Span::styled("kubedeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Select Cluster", Theme::text()),
        ];
        if state.cluster_context().is_unset() {
            title.push(Span::styled(" │ ", Theme::text_dim()));
            title.push(Span::styled(
                "Pick a cluster to start managing resources",
                Theme::text_highlight(),
            ));
        }

        let header = Paragraph::new(Line::from(title)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_list(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let list_area = Layout::centered_list(area, 80);
        let active = state.cluster_context().cluster_id;

        let items: Vec<(String, bool)> = state
            .clusters
            .iter()
            .map(|cluster| {
                let mut display = format!("{:>2}  {}", cluster.id, cluster.name);
                if cluster.context != cluster.name {
                    display.push_str(&format!("  (context: {})", cluster.context));
                }
                if let Some(server) = &cluster.server {
                    display.push_str(&format!("  {}", server));
                }
                (display, active == Some(cluster.id))
            })
            .collect();

        let selector = ListSelector::new(" Clusters ")
            .items(items)
            .marker("active")
            .empty_text("No clusters found in kubeconfig");

        frame.render_list_selector(list_area, selector, &mut state.ui_state.list_state);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let status = StatusBar::new()
            .hints(list_nav_hints())
            .right(format!("{} clusters", state.clusters.len()));

        frame.render_widget(status, area);
    }
}

use ratatui::{Frame, widgets::Clear};

use crate::{
    app::AppState,
    ui::{
        Layout,
        components::{ListSelector, ListSelectorExt},
    },
};

/// Namespace popup over the resource list
pub struct NamespacePicker;

impl NamespacePicker {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let options = state.namespace_options();
        let current = state.console.scope().namespace;
        let height = (options.len() as u16).saturating_add(2).clamp(5, 20);
        let area = Layout::popup(frame.area(), 48, height);

        let items: Vec<(String, bool)> = options
            .iter()
            .map(|option| {
                let text = option.as_deref().unwrap_or("(all namespaces)").to_string();
                (text, *option == current)
            })
            .collect();

        let selector = ListSelector::new(" Namespace ")
            .items(items)
            .empty_text("No namespaces");

        frame.render_widget(Clear, area);
        if let Some(picker) = state.ui_state.namespace_picker.as_mut() {
            frame.render_list_selector(area, selector, picker);
        }
    }
}

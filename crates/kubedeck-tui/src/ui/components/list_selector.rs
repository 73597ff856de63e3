use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::ui::Theme;

/// A generic list selector component
pub struct ListSelector<'a> {
    items: Vec<ListItem<'a>>,
    title: &'a str,
    marker: &'a str,
    empty_text: Option<&'a str>,
}

impl<'a> ListSelector<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            items: Vec::new(),
            title,
            marker: "current",
            empty_text: None,
        }
    }

    /// Add items from an iterator of (display_text, is_current) tuples
    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let marker = self.marker;
        self.items = items
            .into_iter()
            .map(|(text, is_current)| {
                let text = text.into();
                let content = if is_current {
                    Line::from(Span::styled(
                        format!("{} ({})", text, marker),
                        Theme::list_item_current(),
                    ))
                } else {
                    Line::from(Span::styled(text, Theme::list_item()))
                };

                ListItem::new(content)
            })
            .collect();
        self
    }

    /// Word shown next to the current entry
    pub fn marker(mut self, marker: &'a str) -> Self {
        self.marker = marker;
        self
    }

    /// Text shown instead of an empty list
    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = Some(text);
        self
    }
}

impl StatefulWidget for ListSelector<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(self.title, Theme::title()));

        let items = match (self.items.is_empty(), self.empty_text) {
            (true, Some(text)) => vec![ListItem::new(Span::styled(text, Theme::text_dim()))],
            _ => self.items,
        };

        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        StatefulWidget::render(list, area, buf, state);
    }
}

/// Extension trait to render ListSelector more easily
pub trait ListSelectorExt {
    fn render_list_selector(&mut self, area: Rect, selector: ListSelector, state: &mut ListState);
}

impl ListSelectorExt for ratatui::Frame<'_> {
    fn render_list_selector(&mut self, area: Rect, selector: ListSelector, state: &mut ListState) {
        self.render_stateful_widget(selector, area, state);
    }
}

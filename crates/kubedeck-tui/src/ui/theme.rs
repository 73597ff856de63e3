use ratatui::style::{Color, Modifier, Style};

use kubedeck_console::{ConfirmVariant, NoticeLevel};
use kubedeck_types::StatusTone;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const SECONDARY: Color = Color::Blue;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // List styles
    pub fn list_item() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn list_item_current() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    // Table styles
    pub fn table_header() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Row color derived from the item's health
    pub fn tone(tone: StatusTone) -> Style {
        Style::default().fg(tone.color())
    }

    /// Checkbox cell of a selected row
    pub fn checked() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn control(danger: bool, enabled: bool) -> Style {
        match (danger, enabled) {
            (_, false) => Self::text_dim().add_modifier(Modifier::CROSSED_OUT),
            (true, true) => Style::default().fg(Self::ERROR),
            (false, true) => Style::default().fg(Self::SECONDARY),
        }
    }

    // Dialogs
    pub fn confirm_border(variant: ConfirmVariant) -> Style {
        match variant {
            ConfirmVariant::Danger => Style::default().fg(Self::ERROR),
            ConfirmVariant::Warning => Style::default().fg(Self::WARNING),
        }
    }

    pub fn notice(level: NoticeLevel) -> Style {
        match level {
            NoticeLevel::Pending => Style::default().fg(Self::PRIMARY),
            NoticeLevel::Success => Style::default().fg(Self::SUCCESS),
            NoticeLevel::Error => Style::default().fg(Self::ERROR),
        }
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}

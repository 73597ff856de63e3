mod confirm_dialog;
mod error_popup;
mod help_overlay;
mod list_selector;
mod status_bar;
mod text_prompt;
mod toasts;

pub use confirm_dialog::ConfirmDialog;
pub use error_popup::ErrorPopup;
pub use help_overlay::HelpOverlay;
pub use list_selector::{ListSelector, ListSelectorExt};
pub use status_bar::{StatusBar, list_nav_hints, resource_list_hints};
pub use text_prompt::TextPrompt;
pub use toasts::Toasts;

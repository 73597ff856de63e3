//! TUI components for kubedeck
//!
//! This crate provides the terminal user interface for kubedeck,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, InputMode, Screen, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{
    ConfirmDialog, ErrorPopup, HelpOverlay, ListSelector, ListSelectorExt, StatusBar, TextPrompt,
    Toasts, list_nav_hints, resource_list_hints,
};
pub use ui::screens::{AuditLogScreen, ClusterSelectScreen, NamespacePicker, ResourceListScreen};
pub use ui::{Layout, Theme};

//! Configuration for kubedeck-tui

mod keybindings;

pub use keybindings::{KeyBinding, KeyBindings, KeyContext};

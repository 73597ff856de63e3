use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{Action, InputMode, Screen};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    ListNavigation,
    ResourceList,
    TextInput,
    Dialog,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::shift(KeyCode::Char('A')), Action::ShowAuditLog);
        global.insert(
            KeyBinding::new(KeyCode::Char('c')),
            Action::Navigate(Screen::ClusterSelect),
        );
        bindings.insert(KeyContext::Global, global);

        // List navigation bindings
        let mut list_nav = HashMap::new();
        list_nav.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        list_nav.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        list_nav.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        list_nav.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        list_nav.insert(KeyBinding::new(KeyCode::Char('g')), Action::ListTop);
        list_nav.insert(KeyBinding::new(KeyCode::Home), Action::ListTop);
        list_nav.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ListBottom);
        list_nav.insert(KeyBinding::new(KeyCode::End), Action::ListBottom);
        list_nav.insert(KeyBinding::new(KeyCode::Enter), Action::ListSelect);
        bindings.insert(KeyContext::ListNavigation, list_nav.clone());

        // Resource table: list navigation plus selection, batch and scope keys
        let mut resources = list_nav;
        resources.remove(&KeyBinding::new(KeyCode::Enter));
        resources.insert(KeyBinding::new(KeyCode::Char(' ')), Action::ToggleRow);
        resources.insert(KeyBinding::new(KeyCode::Char('a')), Action::ToggleAll);
        resources.insert(KeyBinding::new(KeyCode::Char('x')), Action::ClearSelection);
        resources.insert(KeyBinding::shift(KeyCode::Char('D')), Action::BatchDelete);
        resources.insert(KeyBinding::shift(KeyCode::Char('R')), Action::BatchRestart);
        resources.insert(KeyBinding::shift(KeyCode::Char('L')), Action::OpenLabelPrompt);
        resources.insert(KeyBinding::new(KeyCode::Char('f')), Action::CycleStatusFilter);
        resources.insert(KeyBinding::new(KeyCode::Char('n')), Action::OpenNamespacePicker);
        resources.insert(KeyBinding::new(KeyCode::Tab), Action::NextKind);
        resources.insert(KeyBinding::shift(KeyCode::BackTab), Action::PrevKind);
        resources.insert(KeyBinding::new(KeyCode::BackTab), Action::PrevKind);
        resources.insert(KeyBinding::ctrl(KeyCode::Char('r')), Action::Refresh);
        resources.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        resources.insert(KeyBinding::ctrl(KeyCode::Char('n')), Action::DismissNotice);
        for (idx, digit) in ('1'..='9').enumerate() {
            resources.insert(KeyBinding::new(KeyCode::Char(digit)), Action::SortColumn(idx));
        }
        bindings.insert(KeyContext::ResourceList, resources);

        // Text input bindings (search bar and label prompt)
        let mut text_input = HashMap::new();
        text_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplySearch);
        text_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        text_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        text_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        text_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::TextInput, text_input);

        // Confirmation dialog bindings
        let mut dialog = HashMap::new();
        dialog.insert(KeyBinding::new(KeyCode::Enter), Action::DialogConfirm);
        dialog.insert(KeyBinding::new(KeyCode::Char('y')), Action::DialogConfirm);
        dialog.insert(KeyBinding::new(KeyCode::Esc), Action::DialogCancel);
        dialog.insert(KeyBinding::new(KeyCode::Char('n')), Action::DialogCancel);
        dialog.insert(KeyBinding::new(KeyCode::Char('f')), Action::DialogToggleForce);
        dialog.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        bindings.insert(KeyContext::Dialog, dialog);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // The dialog swallows everything it does not bind
        if context == KeyContext::Dialog {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event on the resource table. Characters bound nowhere else
    /// are offered to the row actions as hotkeys.
    pub fn get_resource_list_action(&self, key: &KeyEvent) -> Option<Action> {
        if let Some(action) = self.get_action(KeyContext::ResourceList, key) {
            return Some(action);
        }

        match key.code {
            KeyCode::Char(c) if is_plain(key) => Some(Action::RowAction(c)),
            _ => None,
        }
    }

    /// Handle key event while typing into the search bar or the label prompt
    /// Returns Some(Action) for special keys and for regular character input
    pub fn get_text_input_action(&self, mode: InputMode, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::TextInput)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(match (mode, action) {
                (InputMode::Label, Action::ApplySearch) => Action::SubmitLabel,
                (InputMode::Label, Action::CloseSearch) => Action::CancelLabel,
                (InputMode::Label, Action::SearchBackspace) => Action::LabelBackspace,
                (_, action) => action.clone(),
            });
        }

        // For regular characters, return an input action
        match key.code {
            KeyCode::Char(c) if is_plain(key) => Some(match mode {
                InputMode::Label => Action::LabelInput(c),
                _ => Action::SearchInput(c),
            }),
            _ => None,
        }
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shifted(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::SHIFT)
    }

    #[test]
    fn test_resource_list_keys() {
        let keys = KeyBindings::new();
        assert_eq!(
            keys.get_resource_list_action(&key(KeyCode::Char(' '))),
            Some(Action::ToggleRow)
        );
        assert_eq!(
            keys.get_resource_list_action(&shifted('D')),
            Some(Action::BatchDelete)
        );
        assert_eq!(
            keys.get_resource_list_action(&key(KeyCode::Char('3'))),
            Some(Action::SortColumn(2))
        );
        assert_eq!(
            keys.get_resource_list_action(&key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_unbound_chars_become_row_actions() {
        let keys = KeyBindings::new();
        assert_eq!(
            keys.get_resource_list_action(&key(KeyCode::Char('d'))),
            Some(Action::RowAction('d'))
        );
        assert_eq!(
            keys.get_resource_list_action(&key(KeyCode::Char('r'))),
            Some(Action::RowAction('r'))
        );
        assert_eq!(keys.get_resource_list_action(&key(KeyCode::F(5))), None);
    }

    #[test]
    fn test_text_input_depends_on_mode() {
        let keys = KeyBindings::new();
        assert_eq!(
            keys.get_text_input_action(InputMode::Search, &key(KeyCode::Char('q'))),
            Some(Action::SearchInput('q'))
        );
        assert_eq!(
            keys.get_text_input_action(InputMode::Label, &key(KeyCode::Char('='))),
            Some(Action::LabelInput('='))
        );
        assert_eq!(
            keys.get_text_input_action(InputMode::Label, &key(KeyCode::Enter)),
            Some(Action::SubmitLabel)
        );
        assert_eq!(
            keys.get_text_input_action(InputMode::Search, &key(KeyCode::Esc)),
            Some(Action::CloseSearch)
        );
    }

    #[test]
    fn test_dialog_does_not_fall_back() {
        let keys = KeyBindings::new();
        assert_eq!(
            keys.get_action(KeyContext::Dialog, &key(KeyCode::Char('y'))),
            Some(Action::DialogConfirm)
        );
        assert_eq!(
            keys.get_action(KeyContext::Dialog, &key(KeyCode::Char('f'))),
            Some(Action::DialogToggleForce)
        );
        assert_eq!(keys.get_action(KeyContext::Dialog, &key(KeyCode::Char('q'))), None);
    }
}

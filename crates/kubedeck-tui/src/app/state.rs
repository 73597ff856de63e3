use std::sync::Arc;

use ratatui::widgets::{ListState, TableState};
use tokio::sync::mpsc;

use kubedeck_console::{
    AuditLog, ClusterContext, ConsoleView, NotificationCenter, Session, resolve_cluster,
};
use kubedeck_types::{ClusterId, ClusterInfo, ResourceKind};

use super::Action;

/// Screen enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    ClusterSelect,
    ResourceList,
    AuditLog,
}

/// What keystrokes currently feed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Label,
}

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    pub input_mode: InputMode,

    /// Search text being typed; applied to the console as it changes
    pub search_input: String,

    /// Label spec being typed, e.g. `team=web,tier=frontend`
    pub label_input: String,

    /// Validation error for the label prompt
    pub label_error: Option<String>,

    /// List state for the cluster and audit screens
    pub list_state: ListState,

    /// Highlighted row of the resource table
    pub table_state: TableState,

    /// Open namespace picker and its highlighted entry
    pub namespace_picker: Option<ListState>,

    /// Error message to display (if any)
    pub error_message: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            help_visible: false,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            label_input: String::new(),
            label_error: None,
            list_state,
            table_state,
            namespace_picker: None,
            error_message: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Current screen being displayed
    pub current_screen: Screen,

    /// Navigation stack for back navigation
    pub screen_stack: Vec<Screen>,

    /// Clusters from the kubeconfig
    pub clusters: Vec<ClusterInfo>,

    /// Cluster given on the command line; wins over the ambient selection
    pub explicit_cluster: Option<String>,

    /// Cluster picked in the UI, or the kubeconfig's current context
    pub active_cluster: Option<ClusterId>,

    /// Resource kind shown by the console
    pub kind: ResourceKind,

    /// Console for `kind`
    pub console: Box<dyn ConsoleView>,

    /// Bumped whenever the console is replaced; events tagged with an older
    /// serial belong to a discarded console
    pub console_serial: u64,

    pub session: Session,
    pub notices: Arc<NotificationCenter>,
    pub audit: AuditLog,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Channel sender for async actions
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// Dirty flag for rendering - only render when true
    pub render_dirty: bool,
}

impl AppState {
    pub fn new(
        action_tx: mpsc::UnboundedSender<Action>,
        session: Session,
        kind: ResourceKind,
        console: Box<dyn ConsoleView>,
    ) -> Self {
        Self {
            current_screen: Screen::ClusterSelect,
            screen_stack: Vec::new(),
            clusters: Vec::new(),
            explicit_cluster: None,
            active_cluster: None,
            kind,
            console,
            console_serial: 0,
            session,
            notices: Arc::new(NotificationCenter::default()),
            audit: AuditLog::default(),
            ui_state: UiState::default(),
            should_quit: false,
            action_tx,
            render_dirty: true, // Start dirty to ensure initial render
        }
    }

    /// The cluster the console should operate on
    pub fn cluster_context(&self) -> ClusterContext {
        resolve_cluster(self.explicit_cluster.as_deref(), self.active_cluster)
    }

    pub fn current_cluster(&self) -> Option<&ClusterInfo> {
        let id = self.cluster_context().cluster_id?;
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Swap in the console for another kind. Returns the new serial.
    pub fn replace_console(&mut self, kind: ResourceKind, console: Box<dyn ConsoleView>) -> u64 {
        self.kind = kind;
        self.console = console;
        self.console_serial += 1;
        self.ui_state.search_input.clear();
        self.ui_state.input_mode = InputMode::Normal;
        self.ui_state.namespace_picker = None;
        self.ui_state.table_state.select(Some(0));
        self.console_serial
    }

    /// Navigate to a new screen, pushing current to stack
    pub fn navigate_to(&mut self, screen: Screen) {
        if self.current_screen == screen {
            return;
        }
        self.screen_stack.push(self.current_screen);
        self.current_screen = screen;
        self.ui_state.list_state.select(Some(0));
    }

    /// Go back to previous screen
    pub fn go_back(&mut self) -> bool {
        if let Some(prev_screen) = self.screen_stack.pop() {
            self.current_screen = prev_screen;
            self.ui_state.list_state.select(Some(0));
            true
        } else {
            false
        }
    }

    /// Entries of the namespace picker. Consoles that do not need a namespace
    /// start with an "all namespaces" entry.
    pub fn namespace_options(&self) -> Vec<Option<String>> {
        let all = (!self.console.namespace_required()).then_some(None);
        all.into_iter()
            .chain(
                self.console
                    .namespaces()
                    .iter()
                    .map(|ns| Some(ns.name.clone())),
            )
            .collect()
    }

    pub fn open_namespace_picker(&mut self) {
        let options = self.namespace_options();
        let current = self.console.scope().namespace;
        let idx = options.iter().position(|o| *o == current).unwrap_or(0);
        let mut picker = ListState::default();
        picker.select(Some(idx));
        self.ui_state.namespace_picker = Some(picker);
    }

    /// Get the current list length based on screen
    pub fn current_list_len(&self) -> usize {
        if self.ui_state.namespace_picker.is_some() {
            return self.namespace_options().len();
        }
        match self.current_screen {
            Screen::ClusterSelect => self.clusters.len(),
            Screen::ResourceList => self.console.visible_len(),
            Screen::AuditLog => self.audit.len(),
        }
    }

    fn current_selection(&self) -> (Option<usize>, usize) {
        let len = self.current_list_len();
        let selected = if let Some(picker) = &self.ui_state.namespace_picker {
            picker.selected()
        } else if self.current_screen == Screen::ResourceList {
            self.ui_state.table_state.selected()
        } else {
            self.ui_state.list_state.selected()
        };
        (selected, len)
    }

    fn select(&mut self, idx: Option<usize>) {
        if let Some(picker) = &mut self.ui_state.namespace_picker {
            picker.select(idx);
        } else if self.current_screen == Screen::ResourceList {
            self.ui_state.table_state.select(idx);
        } else {
            self.ui_state.list_state.select(idx);
        }
    }

    /// Move selection up
    pub fn list_up(&mut self) {
        let (selected, len) = self.current_selection();
        if len == 0 {
            return;
        }

        let i = match selected {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.select(Some(i));
    }

    /// Move selection down
    pub fn list_down(&mut self) {
        let (selected, len) = self.current_selection();
        if len == 0 {
            return;
        }

        let i = match selected {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.select(Some(i));
    }

    pub fn list_top(&mut self) {
        self.select(Some(0));
    }

    pub fn list_bottom(&mut self) {
        let (_, len) = self.current_selection();
        self.select(Some(len.saturating_sub(1)));
    }

    /// Get currently selected index
    pub fn selected_index(&self) -> Option<usize> {
        self.current_selection().0
    }

    /// Keep the table highlight on a row after the row set changed
    pub fn clamp_table_selection(&mut self) {
        let len = self.console.visible_len();
        let selected = self.ui_state.table_state.selected().unwrap_or(0);
        self.ui_state
            .table_state
            .select(Some(selected.min(len.saturating_sub(1))));
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    /// Start search input mode, editing the current search
    pub fn start_search(&mut self) {
        self.ui_state.input_mode = InputMode::Search;
        self.ui_state.search_input = self.console.search().to_string();
    }

    /// Leave search input and clear the search
    pub fn cancel_search(&mut self) {
        self.ui_state.input_mode = InputMode::Normal;
        self.ui_state.search_input.clear();
        self.console.set_search("");
        self.clamp_table_selection();
    }

    /// Leave search input, keeping the search
    pub fn apply_search(&mut self) {
        self.ui_state.input_mode = InputMode::Normal;
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
        self.sync_search();
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
        self.sync_search();
    }

    pub fn search_clear(&mut self) {
        self.ui_state.search_input.clear();
        self.sync_search();
    }

    fn sync_search(&mut self) {
        let search = self.ui_state.search_input.clone();
        self.console.set_search(&search);
        self.clamp_table_selection();
    }

    pub fn start_label_prompt(&mut self) {
        self.ui_state.input_mode = InputMode::Label;
        self.ui_state.label_input.clear();
        self.ui_state.label_error = None;
    }

    pub fn close_label_prompt(&mut self) {
        self.ui_state.input_mode = InputMode::Normal;
        self.ui_state.label_input.clear();
        self.ui_state.label_error = None;
    }
}

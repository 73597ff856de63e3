use kubedeck_types::{ClusterId, ResourceKind};

use crate::app::Screen;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Navigate(Screen),
    GoBack,
    Quit,

    // Scope
    SelectCluster(ClusterId),
    SelectNamespace(Option<String>),
    SwitchKind(ResourceKind),
    NextKind,
    PrevKind,

    // UI toggles
    ToggleHelp,
    OpenNamespacePicker,
    ShowAuditLog,

    // List navigation
    ListUp,
    ListDown,
    ListTop,
    ListBottom,
    ListSelect,

    // Search in the resource table
    OpenSearch,
    CloseSearch,
    ApplySearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,

    // Resource table
    ToggleRow,
    ToggleAll,
    ClearSelection,
    SortColumn(usize),
    CycleStatusFilter,
    /// Row action bound to a hotkey, applied to the highlighted row
    RowAction(char),
    Refresh,

    // Batch operations
    BatchDelete,
    BatchRestart,
    OpenLabelPrompt,
    LabelInput(char),
    LabelBackspace,
    SubmitLabel,
    CancelLabel,

    // Confirmation dialog
    DialogConfirm,
    DialogCancel,
    DialogToggleForce,

    // Notifications
    DismissNotice,
    ShowError(String),
    DismissError,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}

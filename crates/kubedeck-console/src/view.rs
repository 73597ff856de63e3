//! Item-type-erased access to a console, for front ends that switch between
//! resource types at runtime

use std::any::Any;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::warn;

use kubedeck_types::{ItemId, NamespaceInfo, ResourceItem, StatusTone};

use crate::actions::RowControl;
use crate::batch::{BatchSupport, BatchVerb};
use crate::confirm::{ConfirmPhase, Prompt};
use crate::console::{ConsoleEvent, ConsoleStatus, ConsoleTask, ResourceConsole, SortState};
use crate::context::ClusterContext;
use crate::error::ConsoleResult;
use crate::filter::StatusFilter;
use crate::scope::Scope;

/// A console event with its item type erased
pub struct DynEvent(Box<dyn Any + Send>);

impl DynEvent {
    pub fn new<T: ResourceItem>(event: ConsoleEvent<T>) -> Self {
        Self(Box::new(event))
    }
}

pub type DynTask = BoxFuture<'static, DynEvent>;

fn erase<T: ResourceItem>(tasks: Vec<ConsoleTask<T>>) -> Vec<DynTask> {
    tasks
        .into_iter()
        .map(|task| task.map(DynEvent::new).boxed())
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnView {
    pub header: &'static str,
    pub width: u16,
    pub sortable: bool,
    /// `Some(descending)` when the table is sorted by this column
    pub sorted: Option<bool>,
}

/// One visible row, rendered
#[derive(Clone, Debug)]
pub struct RowView {
    pub id: ItemId,
    pub cells: Vec<String>,
    pub tone: StatusTone,
    pub selected: bool,
    pub controls: Vec<RowControl>,
}

pub trait ConsoleView: Send {
    fn title(&self) -> &str;
    fn noun(&self) -> &str;
    fn admin_only(&self) -> bool;
    fn status(&self) -> ConsoleStatus;
    fn scope(&self) -> Scope;
    fn namespaces(&self) -> &[NamespaceInfo];
    fn namespace_required(&self) -> bool;
    fn last_error(&self) -> Option<&str>;
    fn is_loading(&self) -> bool;
    fn is_busy(&self) -> bool;

    fn select_cluster(&mut self, context: ClusterContext) -> Vec<DynTask>;
    fn select_namespace(&mut self, namespace: Option<String>) -> Vec<DynTask>;
    fn refresh(&mut self) -> Vec<DynTask>;
    fn handle(&mut self, event: DynEvent) -> Vec<DynTask>;

    fn columns(&self) -> Vec<ColumnView>;
    fn rows(&self) -> Vec<RowView>;
    fn visible_len(&self) -> usize;
    fn total_len(&self) -> usize;
    fn sort_by_column(&mut self, column: usize) -> bool;

    fn search(&self) -> &str;
    fn set_search(&mut self, search: &str);
    /// Status field name and current selector, when the resource has one
    fn status_filter(&self) -> Option<(&str, &StatusFilter)>;
    fn cycle_status_filter(&mut self);

    fn toggle_row(&mut self, index: usize) -> bool;
    fn toggle_all(&mut self);
    fn clear_selection(&mut self);
    fn selected_count(&self) -> usize;

    fn trigger_action(&mut self, key: &str, index: usize) -> ConsoleResult<Vec<DynTask>>;
    /// Trigger the action bound to `hotkey` on the row at `index`
    fn trigger_hotkey(&mut self, hotkey: char, index: usize) -> Option<ConsoleResult<Vec<DynTask>>>;
    fn batch_support(&self) -> BatchSupport;
    fn request_batch(&mut self, verb: BatchVerb) -> ConsoleResult<()>;

    fn prompt(&self) -> Option<&Prompt>;
    fn confirm_phase(&self) -> ConfirmPhase;
    fn force(&self) -> bool;
    fn toggle_force(&mut self) -> bool;
    fn confirm(&mut self) -> Vec<DynTask>;
    fn cancel_confirmation(&mut self) -> bool;
}

impl<T: ResourceItem> ResourceConsole<T> {
    fn row_id(&self, index: usize) -> Option<ItemId> {
        self.row(index).map(|row| row.id.clone())
    }
}

impl<T: ResourceItem> ConsoleView for ResourceConsole<T> {
    fn title(&self) -> &str {
        &self.config().title
    }

    fn noun(&self) -> &str {
        &self.config().noun
    }

    fn admin_only(&self) -> bool {
        self.config().admin_only
    }

    fn status(&self) -> ConsoleStatus {
        ResourceConsole::status(self)
    }

    fn scope(&self) -> Scope {
        ResourceConsole::scope(self)
    }

    fn namespaces(&self) -> &[NamespaceInfo] {
        ResourceConsole::namespaces(self)
    }

    fn namespace_required(&self) -> bool {
        self.config().namespace_required
    }

    fn last_error(&self) -> Option<&str> {
        ResourceConsole::last_error(self)
    }

    fn is_loading(&self) -> bool {
        ResourceConsole::is_loading(self)
    }

    fn is_busy(&self) -> bool {
        ResourceConsole::is_busy(self)
    }

    fn select_cluster(&mut self, context: ClusterContext) -> Vec<DynTask> {
        erase(ResourceConsole::select_cluster(self, context))
    }

    fn select_namespace(&mut self, namespace: Option<String>) -> Vec<DynTask> {
        erase(ResourceConsole::select_namespace(self, namespace))
    }

    fn refresh(&mut self) -> Vec<DynTask> {
        erase(ResourceConsole::refresh(self))
    }

    fn handle(&mut self, event: DynEvent) -> Vec<DynTask> {
        match event.0.downcast::<ConsoleEvent<T>>() {
            Ok(event) => erase(ResourceConsole::handle(self, *event)),
            Err(_) => {
                warn!(resource = %self.config().noun, "dropping event for another resource type");
                Vec::new()
            }
        }
    }

    fn columns(&self) -> Vec<ColumnView> {
        let sort: Option<SortState> = self.sort();
        self.config()
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| ColumnView {
                header: column.header,
                width: column.width,
                sortable: column.sortable,
                sorted: sort.filter(|s| s.column == idx).map(|s| s.descending),
            })
            .collect()
    }

    fn rows(&self) -> Vec<RowView> {
        let config = self.config();
        ResourceConsole::rows(self)
            .map(|row| RowView {
                id: row.id.clone(),
                cells: config.columns.iter().map(|c| c.render(&row.item)).collect(),
                tone: row.item.tone(),
                selected: self.is_selected(&row.id),
                controls: self.controls(&row.id),
            })
            .collect()
    }

    fn visible_len(&self) -> usize {
        ResourceConsole::visible_len(self)
    }

    fn total_len(&self) -> usize {
        ResourceConsole::total_len(self)
    }

    fn sort_by_column(&mut self, column: usize) -> bool {
        ResourceConsole::sort_by_column(self, column)
    }

    fn search(&self) -> &str {
        ResourceConsole::search(self)
    }

    fn set_search(&mut self, search: &str) {
        ResourceConsole::set_search(self, search)
    }

    fn status_filter(&self) -> Option<(&str, &StatusFilter)> {
        self.config()
            .status_filter
            .as_ref()
            .map(|spec| (spec.field, ResourceConsole::status_filter(self)))
    }

    fn cycle_status_filter(&mut self) {
        ResourceConsole::cycle_status_filter(self)
    }

    fn toggle_row(&mut self, index: usize) -> bool {
        match self.row_id(index) {
            Some(id) => self.toggle(&id),
            None => false,
        }
    }

    fn toggle_all(&mut self) {
        ResourceConsole::toggle_all(self)
    }

    fn clear_selection(&mut self) {
        ResourceConsole::clear_selection(self)
    }

    fn selected_count(&self) -> usize {
        self.selection().len()
    }

    fn trigger_action(&mut self, key: &str, index: usize) -> ConsoleResult<Vec<DynTask>> {
        let Some(id) = self.row_id(index) else {
            return Ok(Vec::new());
        };
        ResourceConsole::trigger_action(self, key, &id).map(erase)
    }

    fn trigger_hotkey(
        &mut self,
        hotkey: char,
        index: usize,
    ) -> Option<ConsoleResult<Vec<DynTask>>> {
        let key = self
            .config()
            .actions
            .iter()
            .find(|a| a.hotkey == Some(hotkey))?
            .key;
        Some(ConsoleView::trigger_action(self, key, index))
    }

    fn batch_support(&self) -> BatchSupport {
        self.config().batch
    }

    fn request_batch(&mut self, verb: BatchVerb) -> ConsoleResult<()> {
        ResourceConsole::request_batch(self, verb)
    }

    fn prompt(&self) -> Option<&Prompt> {
        ResourceConsole::prompt(self)
    }

    fn confirm_phase(&self) -> ConfirmPhase {
        ResourceConsole::confirm_phase(self)
    }

    fn force(&self) -> bool {
        ResourceConsole::force(self)
    }

    fn toggle_force(&mut self) -> bool {
        ResourceConsole::toggle_force(self)
    }

    fn confirm(&mut self) -> Vec<DynTask> {
        erase(ResourceConsole::confirm(self))
    }

    fn cancel_confirmation(&mut self) -> bool {
        ResourceConsole::cancel_confirmation(self)
    }
}

//! One resource console: scope, rows, filters, selection and effects for a
//! single resource type.
//!
//! The console never awaits anything itself. Operations that need the network
//! return [`ConsoleTask`]s; the caller runs them and feeds the resulting
//! [`ConsoleEvent`]s back through [`ResourceConsole::handle`].

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use kubedeck_types::{ApiError, ClusterId, ItemId, NamespaceInfo, ResourceItem, UserMessage};

use crate::actions::{ActionContext, ActionDef, Dispatch, RowControl, controls_for, dispatch};
use crate::audit::{AuditEntry, AuditLog, AuditOutcome};
use crate::batch::{BatchExecutor, BatchFailure, BatchVerb};
use crate::config::ConsoleConfig;
use crate::confirm::{ConfirmPhase, ConfirmTicket, ConfirmVariant, Confirmation, Confirmed, Prompt};
use crate::context::ClusterContext;
use crate::error::{ConsoleError, ConsoleResult};
use crate::feedback::{FeedbackLabels, Notice, NotificationSink, run_with_feedback};
use crate::fetch::{FetchTicket, FetchTracker, Row, derive_rows};
use crate::filter::{Filter, StatusFilter};
use crate::ops::{DeleteMode, ResourceOps};
use crate::scope::{ClusterEpoch, NamespacesApplied, Scope, ScopeState};
use crate::selection::Selection;
use crate::session::Session;

/// Process-wide collaborators shared by every console
#[derive(Clone)]
pub struct ConsoleContext {
    pub session: Session,
    pub notifier: Arc<dyn NotificationSink>,
    pub audit: AuditLog,
}

/// Completion of a task started by the console
pub enum ConsoleEvent<T> {
    NamespacesLoaded {
        epoch: ClusterEpoch,
        result: Result<Vec<NamespaceInfo>, ApiError>,
    },
    Fetched {
        ticket: FetchTicket,
        result: Result<Vec<T>, ApiError>,
    },
    EffectFinished {
        ticket: Option<ConfirmTicket>,
        refresh: bool,
        clear_selection: bool,
    },
}

pub type ConsoleTask<T> = BoxFuture<'static, ConsoleEvent<T>>;

/// What the list area should show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleStatus {
    ClusterRequired,
    NamespaceRequired,
    NoNamespaces,
    Loading,
    Empty,
    Ready,
}

impl ConsoleStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ClusterRequired => "Select a cluster to continue",
            Self::NamespaceRequired => "Select a namespace",
            Self::NoNamespaces => "This cluster has no namespaces",
            Self::Loading => "Loading...",
            Self::Empty => "Nothing to show",
            Self::Ready => "",
        }
    }
}

/// Effect waiting behind the confirmation dialog. Items are resolved when the
/// user confirms, not when the dialog opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingEffect {
    Single { action: &'static str, id: ItemId },
    Batch(BatchVerb),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub descending: bool,
}

pub struct ResourceConsole<T> {
    config: ConsoleConfig<T>,
    ops: ResourceOps<T>,
    executor: BatchExecutor<T>,
    ctx: ConsoleContext,
    scope: ScopeState,
    fetch: FetchTracker,
    rows: Vec<Row<T>>,
    /// Indices into `rows`, in display order
    visible: Vec<usize>,
    search: String,
    status_filter: StatusFilter,
    sort: Option<SortState>,
    selection: Selection,
    confirmation: Confirmation<PendingEffect>,
    running: usize,
    last_error: Option<String>,
}

impl<T: ResourceItem> ResourceConsole<T> {
    pub fn new(config: ConsoleConfig<T>, ops: ResourceOps<T>, ctx: ConsoleContext) -> Self {
        let executor = BatchExecutor::new(ops.clone(), config.batch, config.noun.clone());
        let scope = ScopeState::new(config.namespace_required);
        Self {
            config,
            ops,
            executor,
            ctx,
            scope,
            fetch: FetchTracker::new(),
            rows: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            status_filter: StatusFilter::All,
            sort: None,
            selection: Selection::new(),
            confirmation: Confirmation::new(),
            running: 0,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Scope
    // ------------------------------------------------------------------

    /// Apply a resolved cluster context. Switching clusters clears the rows and
    /// the selection and enumerates the new cluster's namespaces.
    pub fn select_cluster(&mut self, context: ClusterContext) -> Vec<ConsoleTask<T>> {
        let Some(cluster_id) = context.cluster_id else {
            return Vec::new();
        };
        let Some(epoch) = self.scope.set_cluster(cluster_id) else {
            return Vec::new();
        };
        debug!(
            cluster_id,
            source = ?context.source,
            resource = %self.config.noun,
            "cluster changed"
        );
        self.reset_rows();

        let mut tasks = vec![self.namespaces_task(cluster_id, epoch)];
        if !self.config.namespace_required {
            tasks.extend(self.start_fetch());
        }
        tasks
    }

    /// Select a namespace, or all namespaces with `None` where the resource allows it
    pub fn select_namespace(&mut self, namespace: Option<String>) -> Vec<ConsoleTask<T>> {
        if namespace.is_none() && self.config.namespace_required {
            return Vec::new();
        }
        if !self.scope.set_namespace(namespace) {
            return Vec::new();
        }
        debug!(
            namespace = ?self.scope.namespace(),
            resource = %self.config.noun,
            "namespace changed"
        );
        self.reset_rows();
        self.start_fetch().into_iter().collect()
    }

    /// Re-run the fetch for the current scope; re-enumerates namespaces if that failed before
    pub fn refresh(&mut self) -> Vec<ConsoleTask<T>> {
        let Some(cluster_id) = self.scope.cluster_id() else {
            return Vec::new();
        };
        if self.config.namespace_required && !self.scope.namespaces_loaded() {
            return vec![self.namespaces_task(cluster_id, self.scope.epoch())];
        }
        self.start_fetch().into_iter().collect()
    }

    /// Feed back the result of a task returned earlier
    pub fn handle(&mut self, event: ConsoleEvent<T>) -> Vec<ConsoleTask<T>> {
        match event {
            ConsoleEvent::NamespacesLoaded { epoch, result } => self.on_namespaces(epoch, result),
            ConsoleEvent::Fetched { ticket, result } => {
                self.on_fetched(ticket, result);
                Vec::new()
            }
            ConsoleEvent::EffectFinished {
                ticket,
                refresh,
                clear_selection,
            } => {
                match ticket {
                    Some(ticket) => {
                        self.confirmation.finish(ticket);
                    }
                    None => self.running = self.running.saturating_sub(1),
                }
                if clear_selection {
                    self.selection.clear();
                }
                if refresh { self.refresh() } else { Vec::new() }
            }
        }
    }

    fn namespaces_task(&self, cluster_id: ClusterId, epoch: ClusterEpoch) -> ConsoleTask<T> {
        let request = (self.ops.list_namespaces)(cluster_id);
        async move {
            ConsoleEvent::NamespacesLoaded {
                epoch,
                result: request.await,
            }
        }
        .boxed()
    }

    fn start_fetch(&mut self) -> Option<ConsoleTask<T>> {
        let cluster_id = self.scope.cluster_id()?;
        if !self.scope.is_settled() {
            return None;
        }
        let ticket = self.fetch.begin(self.scope.generation());
        let namespace = self.scope.namespace().map(str::to_string);
        debug!(
            cluster_id,
            namespace = ?namespace,
            resource = %self.config.noun,
            request = ticket.request,
            "fetching"
        );
        let request = (self.ops.fetch)(cluster_id, namespace);
        Some(
            async move {
                ConsoleEvent::Fetched {
                    ticket,
                    result: request.await,
                }
            }
            .boxed(),
        )
    }

    fn on_namespaces(
        &mut self,
        epoch: ClusterEpoch,
        result: Result<Vec<NamespaceInfo>, ApiError>,
    ) -> Vec<ConsoleTask<T>> {
        match result {
            Ok(namespaces) => {
                let empty = namespaces.is_empty();
                let applied = self.scope.apply_namespaces(epoch, namespaces);
                if applied == NamespacesApplied::Stale {
                    debug!(
                        resource = %self.config.noun,
                        "discarding namespaces of a previous cluster"
                    );
                    return Vec::new();
                }
                if !self.config.namespace_required {
                    if applied != NamespacesApplied::Reselected {
                        return Vec::new();
                    }
                    debug!(
                        resource = %self.config.noun,
                        "namespace missing on this cluster, showing all"
                    );
                    self.reset_rows();
                    return self.start_fetch().into_iter().collect();
                }
                if empty {
                    self.reset_rows();
                    return Vec::new();
                }
                self.start_fetch().into_iter().collect()
            }
            Err(err) => {
                if epoch != self.scope.epoch() {
                    debug!(
                        resource = %self.config.noun,
                        "discarding namespace error of a previous cluster"
                    );
                    return Vec::new();
                }
                warn!(error = %err, "failed to list namespaces");
                self.report_error("Failed to load namespaces", &err);
                Vec::new()
            }
        }
    }

    fn on_fetched(&mut self, ticket: FetchTicket, result: Result<Vec<T>, ApiError>) {
        if !self.fetch.accept(ticket, self.scope.generation()) {
            debug!(
                request = ticket.request,
                resource = %self.config.noun,
                "discarding superseded fetch result"
            );
            return;
        }
        match result {
            Ok(items) => {
                self.rows = derive_rows(items);
                self.last_error = None;
                self.refilter();
            }
            Err(err) => {
                warn!(error = %err, resource = %self.config.noun, "fetch failed");
                let label = format!("Failed to load {}", self.config.title.to_lowercase());
                self.report_error(&label, &err);
            }
        }
    }

    fn report_error(&mut self, label: &str, err: &dyn UserMessage) {
        let message = format!("{}: {}", label, err.user_message());
        self.ctx.notifier.publish(Notice::error(message.clone()));
        self.last_error = Some(message);
    }

    fn reset_rows(&mut self) {
        self.fetch.cancel();
        self.rows.clear();
        self.visible.clear();
        self.selection.clear();
        self.last_error = None;
    }

    // ------------------------------------------------------------------
    // Filtering and sorting
    // ------------------------------------------------------------------

    pub fn set_search(&mut self, search: &str) {
        if self.search != search {
            self.search = search.to_string();
            self.refilter();
        }
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        if self.status_filter != status {
            self.status_filter = status;
            self.refilter();
        }
    }

    /// Step to the next status option; no-op without a status filter
    pub fn cycle_status_filter(&mut self) {
        let Some(spec) = &self.config.status_filter else {
            return;
        };
        let next = self.status_filter.cycle(&spec.options);
        self.set_status_filter(next);
    }

    /// Cycle a column through ascending, descending and unsorted. Returns false
    /// for columns that do not sort.
    pub fn sort_by_column(&mut self, column: usize) -> bool {
        if !self.config.columns.get(column).is_some_and(|c| c.sortable) {
            return false;
        }
        self.sort = match self.sort {
            Some(SortState {
                column: current,
                descending: false,
            }) if current == column => Some(SortState {
                column,
                descending: true,
            }),
            Some(SortState {
                column: current,
                descending: true,
            }) if current == column => None,
            _ => Some(SortState {
                column,
                descending: false,
            }),
        };
        self.refilter();
        true
    }

    fn refilter(&mut self) {
        let mut filter = Filter::new(&self.search, &self.config.search_fields);
        if let Some(spec) = &self.config.status_filter {
            filter = filter.with_status(spec.field, &self.status_filter);
        }

        let mut visible: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(&row.item))
            .map(|(idx, _)| idx)
            .collect();

        let column = self
            .sort
            .and_then(|sort| self.config.columns.get(sort.column).map(|c| (c, sort.descending)));
        if let Some((column, descending)) = column {
            let rows = &self.rows;
            visible.sort_by(|a, b| {
                let ordering = column.compare(&rows[*a].item, &rows[*b].item);
                if descending { ordering.reverse() } else { ordering }
            });
        }

        self.visible = visible;
        let rows = &self.rows;
        let dropped = self
            .selection
            .retain_visible(self.visible.iter().map(|idx| &rows[*idx].id));
        if dropped > 0 {
            debug!(dropped, "selection narrowed to visible rows");
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Flip a visible row; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        if self.visible_item(id).is_none() {
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn select_all(&mut self) {
        let rows = &self.rows;
        self.selection
            .select_all(self.visible.iter().map(|idx| &rows[*idx].id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every visible row, or clear when all are already selected
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.clear_selection();
        } else {
            self.select_all();
        }
    }

    pub fn all_selected(&self) -> bool {
        self.selection
            .covers(self.visible.iter().map(|idx| &self.rows[*idx].id))
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selection.contains(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected items in display order
    pub fn selected_items(&self) -> Vec<T> {
        self.rows()
            .filter(|row| self.selection.contains(&row.id))
            .map(|row| row.item.clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // Actions and batches
    // ------------------------------------------------------------------

    pub fn controls(&self, id: &ItemId) -> Vec<RowControl> {
        self.visible_item(id)
            .map(|item| controls_for(&self.config.actions, item))
            .unwrap_or_default()
    }

    /// Trigger a row action. Destructive actions only open the confirmation dialog.
    pub fn trigger_action(&mut self, key: &str, id: &ItemId) -> ConsoleResult<Vec<ConsoleTask<T>>> {
        let item = self
            .visible_item(id)
            .cloned()
            .ok_or_else(|| ConsoleError::UnknownItem(id.clone()))?;
        let (action, how) = dispatch(&self.config.actions, key, &item)?;
        match how {
            Dispatch::Confirm(prompt) => {
                let effect = PendingEffect::Single {
                    action: action.key,
                    id: id.clone(),
                };
                self.confirmation.open(prompt, effect);
                Ok(Vec::new())
            }
            Dispatch::Run => {
                let task = self.action_task(action.clone(), item, ActionContext::default(), None);
                self.running += 1;
                Ok(vec![task])
            }
        }
    }

    /// Ask to apply `verb` to the selection; opens the confirmation dialog
    pub fn request_batch(&mut self, verb: BatchVerb) -> ConsoleResult<()> {
        if !self.config.batch.supports(&verb) {
            return Err(ConsoleError::UnsupportedVerb {
                verb: verb.kind(),
                resource: self.config.noun.clone(),
            });
        }
        let selected = self.selected_items();
        if selected.is_empty() {
            return Err(ConsoleError::EmptySelection);
        }

        let what = self.config.count_label(selected.len());
        let names = name_list(&selected);
        let prompt = match &verb {
            BatchVerb::Delete => Prompt::new(
                format!("Delete {}?", what),
                format!("{} will be deleted. This cannot be undone.", names),
            )
            .force_option(self.config.batch_force_option),
            BatchVerb::Restart => Prompt::new(
                format!("Restart {}?", what),
                format!("{} will roll their pods.", names),
            )
            .variant(ConfirmVariant::Warning),
            BatchVerb::Label(labels) => {
                let pairs: Vec<String> =
                    labels.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                Prompt::new(
                    format!("Label {}?", what),
                    format!("Set {} on {}.", pairs.join(", "), names),
                )
                .variant(ConfirmVariant::Warning)
            }
        };
        self.confirmation.open(prompt, PendingEffect::Batch(verb));
        Ok(())
    }

    /// Confirm the open dialog. Returns nothing unless a request is open.
    pub fn confirm(&mut self) -> Vec<ConsoleTask<T>> {
        let Some(Confirmed {
            ticket,
            payload,
            force,
        }) = self.confirmation.confirm()
        else {
            return Vec::new();
        };

        match payload {
            PendingEffect::Single { action, id } => match self.resolve_single(action, &id) {
                Ok((action, item)) => {
                    info!(
                        user = %self.ctx.session.user().name,
                        action = action.key,
                        item = item.name(),
                        force,
                        "running confirmed action"
                    );
                    vec![self.action_task(action, item, ActionContext { force }, Some(ticket))]
                }
                Err(err) => self.abandon(ticket, err),
            },
            PendingEffect::Batch(verb) => {
                let items = self.selected_items();
                if items.is_empty() {
                    return self.abandon(ticket, ConsoleError::EmptySelection);
                }
                info!(
                    user = %self.ctx.session.user().name,
                    verb = verb.kind(),
                    count = items.len(),
                    force,
                    "running confirmed batch"
                );
                vec![self.batch_task(verb, items, DeleteMode::from_force(force), ticket)]
            }
        }
    }

    pub fn cancel_confirmation(&mut self) -> bool {
        self.confirmation.cancel()
    }

    pub fn toggle_force(&mut self) -> bool {
        self.confirmation.toggle_force()
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.confirmation.prompt()
    }

    pub fn confirm_phase(&self) -> ConfirmPhase {
        self.confirmation.phase()
    }

    pub fn force(&self) -> bool {
        self.confirmation.force()
    }

    fn resolve_single(&self, key: &str, id: &ItemId) -> ConsoleResult<(ActionDef<T>, T)> {
        let item = self
            .visible_item(id)
            .ok_or_else(|| ConsoleError::UnknownItem(id.clone()))?;
        let (action, _) = dispatch(&self.config.actions, key, item)?;
        Ok((action.clone(), item.clone()))
    }

    fn abandon(&mut self, ticket: ConfirmTicket, err: ConsoleError) -> Vec<ConsoleTask<T>> {
        warn!(error = %err, "confirmed effect could not start");
        self.ctx.notifier.publish(Notice::error(err.user_message()));
        self.confirmation.finish(ticket);
        Vec::new()
    }

    fn action_task(
        &self,
        action: ActionDef<T>,
        item: T,
        ctx: ActionContext,
        ticket: Option<ConfirmTicket>,
    ) -> ConsoleTask<T> {
        let notifier = Arc::clone(&self.ctx.notifier);
        let labels = action.labels.render(item.name());
        let refresh_after = action.refresh_after;
        let audit = ticket.map(|_| {
            (
                self.ctx.audit.clone(),
                self.audit_entry(action.key, vec![item.name().to_string()]),
            )
        });
        let request = action.run(item, ctx);

        async move {
            let result = run_with_feedback(notifier.as_ref(), labels, request).await;
            if let Some((log, mut entry)) = audit {
                entry.at = Utc::now();
                entry.outcome = match &result {
                    Ok(()) => AuditOutcome::Succeeded,
                    Err(err) => AuditOutcome::Failed(err.user_message()),
                };
                log.record(entry);
            }
            ConsoleEvent::EffectFinished {
                ticket,
                refresh: result.is_ok() && refresh_after,
                clear_selection: false,
            }
        }
        .boxed()
    }

    fn batch_task(
        &self,
        verb: BatchVerb,
        items: Vec<T>,
        mode: DeleteMode,
        ticket: ConfirmTicket,
    ) -> ConsoleTask<T> {
        let notifier = Arc::clone(&self.ctx.notifier);
        let executor = self.executor.clone();
        let what = self.config.count_label(items.len());
        let labels = FeedbackLabels::new(
            format!("{} {}", verb.progressive(), what),
            format!("{} {}", verb.past_tense(), what),
            format!("Failed to {} {}", verb.kind(), what),
        );
        let log = self.ctx.audit.clone();
        let mut entry = self.audit_entry(
            verb.kind(),
            items.iter().map(|item| item.name().to_string()).collect(),
        );

        async move {
            let result =
                run_with_feedback(notifier.as_ref(), labels, executor.execute(&verb, items, mode))
                    .await;
            let (outcome, refresh, clear_selection) = match &result {
                Ok(_) => (AuditOutcome::Succeeded, true, true),
                Err(ConsoleError::Batch(failure)) => {
                    (batch_outcome(failure), failure.needs_refresh(), false)
                }
                Err(err) => (AuditOutcome::Failed(err.user_message()), false, false),
            };
            entry.at = Utc::now();
            entry.outcome = outcome;
            log.record(entry);
            ConsoleEvent::EffectFinished {
                ticket: Some(ticket),
                refresh,
                clear_selection,
            }
        }
        .boxed()
    }

    fn audit_entry(&self, verb: &str, targets: Vec<String>) -> AuditEntry {
        AuditEntry {
            at: Utc::now(),
            user: self.ctx.session.user().name.clone(),
            cluster_id: self.scope.cluster_id(),
            namespace: self.scope.namespace().map(str::to_string),
            resource: self.config.noun.clone(),
            verb: verb.to_string(),
            targets,
            outcome: AuditOutcome::Succeeded,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn config(&self) -> &ConsoleConfig<T> {
        &self.config
    }

    pub fn scope(&self) -> Scope {
        self.scope.scope()
    }

    pub fn namespaces(&self) -> &[NamespaceInfo] {
        self.scope.namespaces()
    }

    /// Visible rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &Row<T>> {
        self.visible.iter().map(|idx| &self.rows[*idx])
    }

    pub fn row(&self, index: usize) -> Option<&Row<T>> {
        self.visible.get(index).map(|idx| &self.rows[*idx])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Rows loaded before filtering
    pub fn total_len(&self) -> usize {
        self.rows.len()
    }

    fn visible_item(&self, id: &ItemId) -> Option<&T> {
        self.rows().find(|row| row.id == *id).map(|row| &row.item)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_loading()
    }

    /// A confirmed effect or a direct action is still running
    pub fn is_busy(&self) -> bool {
        self.confirmation.is_busy() || self.running > 0
    }

    pub fn status(&self) -> ConsoleStatus {
        if self.scope.cluster_id().is_none() {
            return ConsoleStatus::ClusterRequired;
        }
        if self.config.namespace_required {
            if !self.scope.namespaces_loaded() {
                if self.last_error.is_none() {
                    return ConsoleStatus::Loading;
                }
            } else if self.scope.namespaces().is_empty() {
                return ConsoleStatus::NoNamespaces;
            } else if self.scope.namespace().is_none() {
                return ConsoleStatus::NamespaceRequired;
            }
        }
        if self.fetch.is_loading() && self.rows.is_empty() {
            ConsoleStatus::Loading
        } else if self.visible.is_empty() {
            ConsoleStatus::Empty
        } else {
            ConsoleStatus::Ready
        }
    }
}

fn batch_outcome(failure: &BatchFailure) -> AuditOutcome {
    match failure {
        BatchFailure::Aborted(report) => AuditOutcome::Partial {
            completed: report.succeeded(),
            total: report.total(),
            error: failure.user_message(),
        },
        BatchFailure::Bulk { .. } => AuditOutcome::Failed(failure.user_message()),
    }
}

/// "a, b, c and 2 more"
fn name_list<T: ResourceItem>(items: &[T]) -> String {
    const SHOWN: usize = 3;
    let names: Vec<&str> = items.iter().take(SHOWN).map(|i| i.name()).collect();
    let mut text = names.join(", ");
    if items.len() > SHOWN {
        text.push_str(&format!(" and {} more", items.len() - SHOWN));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchSupport;
    use crate::context::resolve_cluster;
    use crate::feedback::NoticeLevel;
    use crate::ops::OpTarget;
    use crate::session::UserInfo;
    use crate::testing::{Counter, RecordingSink, TestItem, drive, item, items, static_ops};
    use futures::future;
    use parking_lot::Mutex;

    fn context(sink: Arc<RecordingSink>) -> ConsoleContext {
        ConsoleContext {
            session: Session::login(UserInfo::new("alice", vec!["admin".to_string()])),
            notifier: sink,
            audit: AuditLog::new(16),
        }
    }

    fn config() -> ConsoleConfig<TestItem> {
        ConsoleConfig::new("Deployments", "deployment")
            .search(&["name", "owner"])
            .status_filter("status", &["Running", "Pending"])
            .batch(BatchSupport::delete())
    }

    fn names(console: &ResourceConsole<TestItem>) -> Vec<String> {
        console.rows().map(|r| r.item.name().to_string()).collect()
    }

    async fn settled(
        ops: ResourceOps<TestItem>,
        config: ConsoleConfig<TestItem>,
    ) -> (ResourceConsole<TestItem>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let mut console = ResourceConsole::new(config, ops, context(sink.clone()));
        let tasks = console.select_cluster(resolve_cluster(None, Some(5)));
        drive(&mut console, tasks).await;
        (console, sink)
    }

    #[tokio::test]
    async fn test_cluster_five_default_namespace_scenario() {
        let (mut console, _) =
            settled(static_ops(&["default"], items(&["a", "b", "c"])), config()).await;

        assert_eq!(console.scope().cluster_id, Some(5));
        assert_eq!(console.scope().namespace.as_deref(), Some("default"));
        assert_eq!(names(&console), ["a", "b", "c"]);
        assert_eq!(console.status(), ConsoleStatus::Ready);

        console.set_search("b");
        assert_eq!(names(&console), ["b"]);

        console.select_all();
        let selected: Vec<_> = console.selection().iter().cloned().collect();
        assert_eq!(selected, [ItemId::derive(5, "default", "b")]);
    }

    #[tokio::test]
    async fn test_first_namespace_in_api_order_is_selected() {
        let list = vec![item("dns").in_namespace("kube-system"), item("web")];
        let (console, _) = settled(static_ops(&["kube-system", "default"], list), config()).await;

        assert_eq!(console.scope().namespace.as_deref(), Some("kube-system"));
        assert_eq!(names(&console), ["dns"]);
    }

    #[tokio::test]
    async fn test_explicit_garbage_falls_back_to_active_cluster() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let ops = ResourceOps::new(
            |_cluster| future::ready(Ok(vec![NamespaceInfo::new("default", "Active")])),
            move |cluster, _namespace| {
                record.lock().push(cluster);
                future::ready(Ok(Vec::<TestItem>::new()))
            },
        );
        let sink = Arc::new(RecordingSink::default());
        let mut console = ResourceConsole::new(config(), ops, context(sink));

        let tasks = console.select_cluster(resolve_cluster(Some("abc"), Some(7)));
        drive(&mut console, tasks).await;
        assert_eq!(*seen.lock(), [7]);
        assert_eq!(console.status(), ConsoleStatus::Empty);
    }

    #[tokio::test]
    async fn test_unset_cluster_requires_selection() {
        let sink = Arc::new(RecordingSink::default());
        let mut console =
            ResourceConsole::new(config(), static_ops(&["default"], items(&["a"])), context(sink));
        let tasks = console.select_cluster(resolve_cluster(None, None));
        assert!(tasks.is_empty());
        assert_eq!(console.status(), ConsoleStatus::ClusterRequired);
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_discarded() {
        let list = vec![item("a"), item("b").in_namespace("other")];
        let (mut console, _) = settled(static_ops(&["default", "other"], list), config()).await;

        let stale = console.refresh();
        let current = console.select_namespace(Some("other".to_string()));
        assert!(console.rows().next().is_none());

        // The older result arrives after the scope moved on
        drive(&mut console, stale).await;
        assert!(console.rows().next().is_none());
        assert!(console.is_loading());

        drive(&mut console, current).await;
        assert_eq!(names(&console), ["b"]);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_rows_and_notifies_once() {
        let calls = Counter::default();
        let counter = calls.clone();
        let ops = ResourceOps::new(
            |_cluster| future::ready(Ok(vec![NamespaceInfo::new("default", "Active")])),
            move |_cluster, _namespace| {
                if counter.hit() == 1 {
                    future::ready(Ok(items(&["a", "b"])))
                } else {
                    future::ready(Err(ApiError::backend(500, "InternalError", "etcd down")))
                }
            },
        );
        let (mut console, sink) = settled(ops, config()).await;
        assert_eq!(names(&console), ["a", "b"]);

        let tasks = console.refresh();
        drive(&mut console, tasks).await;

        assert_eq!(names(&console), ["a", "b"]);
        assert_eq!(
            console.last_error(),
            Some("Failed to load deployments: etcd down")
        );
        let errors: Vec<_> = sink
            .notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_namespace_list_is_an_empty_state() {
        let fetches = Counter::default();
        let counter = fetches.clone();
        let ops = ResourceOps::new(
            |_cluster| future::ready(Ok(Vec::new())),
            move |_cluster, _namespace| {
                counter.hit();
                future::ready(Ok(Vec::<TestItem>::new()))
            },
        );
        let (console, sink) = settled(ops, config()).await;
        assert_eq!(console.status(), ConsoleStatus::NoNamespaces);
        assert_eq!(fetches.get(), 0);
        assert!(sink.notices().is_empty());
    }

    #[tokio::test]
    async fn test_namespaces_of_previous_cluster_are_ignored() {
        let ops = ResourceOps::new(
            |cluster| {
                let name = if cluster == 1 { "from-one" } else { "from-two" };
                future::ready(Ok(vec![NamespaceInfo::new(name, "Active")]))
            },
            |_cluster, _namespace| future::ready(Ok(Vec::<TestItem>::new())),
        );
        let sink = Arc::new(RecordingSink::default());
        let mut console = ResourceConsole::new(config(), ops, context(sink));

        let first = console.select_cluster(resolve_cluster(None, Some(1)));
        let second = console.select_cluster(resolve_cluster(Some("2"), Some(1)));
        drive(&mut console, second).await;
        drive(&mut console, first).await;

        assert_eq!(console.scope().cluster_id, Some(2));
        assert_eq!(console.scope().namespace.as_deref(), Some("from-two"));
    }

    #[tokio::test]
    async fn test_cluster_scoped_console_fetches_without_namespace() {
        let config = config().namespace_required(false);
        let (console, _) = settled(static_ops(&["default"], items(&["a"])), config).await;
        assert_eq!(console.scope().namespace, None);
        assert_eq!(names(&console), ["a"]);
    }

    #[tokio::test]
    async fn test_optional_namespace_falls_back_to_all_on_cluster_change() {
        let fetches = Arc::new(Mutex::new(Vec::new()));
        let record = fetches.clone();
        let ops = ResourceOps::new(
            |cluster| {
                let name = if cluster == 1 { "team-a" } else { "other" };
                future::ready(Ok(vec![NamespaceInfo::new(name, "Active")]))
            },
            move |cluster, namespace: Option<String>| {
                record.lock().push((cluster, namespace));
                future::ready(Ok(vec![item("reader").in_namespace("other")]))
            },
        );
        let sink = Arc::new(RecordingSink::default());
        let mut console =
            ResourceConsole::new(config().namespace_required(false), ops, context(sink));

        let tasks = console.select_cluster(resolve_cluster(None, Some(1)));
        drive(&mut console, tasks).await;
        let tasks = console.select_namespace(Some("team-a".to_string()));
        drive(&mut console, tasks).await;

        let tasks = console.select_cluster(resolve_cluster(None, Some(2)));
        drive(&mut console, tasks).await;

        assert_eq!(console.scope().cluster_id, Some(2));
        assert_eq!(console.scope().namespace, None);
        assert_eq!(fetches.lock().last(), Some(&(2, None)));
        assert_eq!(names(&console), ["reader"]);
        assert_eq!(console.status(), ConsoleStatus::Ready);
    }

    #[tokio::test]
    async fn test_selection_follows_filter() {
        let list = vec![
            item("web").with_status("Running"),
            item("worker").with_status("Pending"),
            item("api").with_status("Running"),
        ];
        let (mut console, _) = settled(static_ops(&["default"], list), config()).await;

        console.select_all();
        assert_eq!(console.selection().len(), 3);

        console.set_status_filter(StatusFilter::parse("running"));
        assert_eq!(names(&console), ["web", "api"]);
        assert_eq!(console.selection().len(), 2);
        assert!(console.all_selected());

        console.cycle_status_filter();
        assert_eq!(console.status_filter(), &StatusFilter::Only("Pending".to_string()));
        assert!(console.selection().is_empty());

        // Hidden rows cannot be toggled
        assert!(!console.toggle(&ItemId::derive(5, "default", "web")));
    }

    #[tokio::test]
    async fn test_sort_cycles_and_keeps_filter_order_otherwise() {
        use crate::config::{ColumnDef, SortKey};
        let mut list = items(&["b", "c", "a"]);
        list[0].replicas = 3;
        list[1].replicas = 1;
        list[2].replicas = 2;
        let config = config()
            .column(ColumnDef::new("name", "NAME", |i: &TestItem| i.name().to_string()))
            .column(
                ColumnDef::new("replicas", "REPLICAS", |i: &TestItem| i.replicas.to_string())
                    .sort_by(|i: &TestItem| SortKey::Number(i.replicas.into())),
            );
        let (mut console, _) = settled(static_ops(&["default"], list), config).await;

        assert!(!console.sort_by_column(0));
        assert!(console.sort_by_column(1));
        assert_eq!(names(&console), ["c", "a", "b"]);
        console.sort_by_column(1);
        assert_eq!(names(&console), ["b", "a", "c"]);
        console.sort_by_column(1);
        assert_eq!(names(&console), ["b", "c", "a"]);
    }

    fn deleting(fail_on: &'static str, deleted: Arc<Mutex<Vec<String>>>) -> ResourceOps<TestItem> {
        static_ops(&["default"], items(&["x", "y", "z"])).with_delete(
            move |target: OpTarget, _mode| {
                deleted.lock().push(target.name.clone());
                if target.name == fail_on {
                    let err = ApiError::backend(409, "Conflict", "object is being deleted");
                    future::ready(Err(err))
                } else {
                    future::ready(Ok(()))
                }
            },
        )
    }

    #[tokio::test]
    async fn test_batch_delete_aborts_and_refreshes() {
        let deleted = Arc::new(Mutex::new(Vec::new()));
        let (mut console, sink) = settled(deleting("y", deleted.clone()), config()).await;

        console.select_all();
        console.request_batch(BatchVerb::Delete).unwrap();
        assert_eq!(console.confirm_phase(), ConfirmPhase::Open);
        assert_eq!(
            console.prompt().map(|p| p.title.as_str()),
            Some("Delete 3 deployments?")
        );

        let tasks = console.confirm();
        assert!(console.is_busy());
        assert!(console.confirm().is_empty());
        drive(&mut console, tasks).await;

        assert_eq!(*deleted.lock(), ["x", "y"]);
        assert_eq!(console.confirm_phase(), ConfirmPhase::Closed);
        // Failure keeps the selection; the refresh re-derived rows from the fake list
        assert_eq!(console.selection().len(), 3);

        let last = sink.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
        assert_eq!(
            last.message,
            "Failed to delete 3 deployments: failed at item 2 of 3 (y): object is being deleted"
        );

        let audit = console.ctx.audit.all();
        assert_eq!(audit.len(), 1);
        assert_eq!(
            audit[0].outcome,
            AuditOutcome::Partial {
                completed: 1,
                total: 3,
                error: "failed at item 2 of 3 (y): object is being deleted".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_batch_success_clears_selection() {
        let deleted = Arc::new(Mutex::new(Vec::new()));
        let (mut console, sink) = settled(deleting("none", deleted.clone()), config()).await;

        console.set_search("x");
        console.select_all();
        console.request_batch(BatchVerb::Delete).unwrap();
        let tasks = console.confirm();
        drive(&mut console, tasks).await;

        assert_eq!(*deleted.lock(), ["x"]);
        assert!(console.selection().is_empty());
        let last = sink.notices().pop().unwrap();
        assert_eq!(last.message, "Deleted 1 deployment");
    }

    #[tokio::test]
    async fn test_batch_requires_selection_and_support() {
        let (mut console, _) = settled(static_ops(&["default"], items(&["a"])), config()).await;
        assert!(matches!(
            console.request_batch(BatchVerb::Delete),
            Err(ConsoleError::EmptySelection)
        ));
        console.select_all();
        assert!(matches!(
            console.request_batch(BatchVerb::Restart),
            Err(ConsoleError::UnsupportedVerb { .. })
        ));
        assert_eq!(console.confirm_phase(), ConfirmPhase::Closed);
    }

    #[tokio::test]
    async fn test_destructive_row_action_runs_once_with_force() {
        let forced = Arc::new(Mutex::new(Vec::new()));
        let record = forced.clone();
        let config = config().batch_force_option().action(
            ActionDef::new("delete", "x", move |item: TestItem, ctx: ActionContext| {
                record.lock().push((item.name().to_string(), ctx.force));
                future::ready(Ok(()))
            })
            .danger()
            .force_option(),
        );
        let (mut console, _) = settled(static_ops(&["default"], items(&["a"])), config).await;
        let id = ItemId::derive(5, "default", "a");

        let tasks = console.trigger_action("delete", &id).unwrap();
        assert!(tasks.is_empty());
        assert!(forced.lock().is_empty());

        assert!(console.toggle_force());
        let first = console.confirm();
        let second = console.confirm();
        assert!(second.is_empty());
        drive(&mut console, first).await;

        assert_eq!(*forced.lock(), [("a".to_string(), true)]);
        assert_eq!(console.confirm_phase(), ConfirmPhase::Closed);
        assert_eq!(console.ctx.audit.len(), 1);
    }

    #[tokio::test]
    async fn test_direct_action_runs_and_refreshes() {
        let restarts = Counter::default();
        let fetches = Counter::default();
        let (r, f) = (restarts.clone(), fetches.clone());
        let ops = ResourceOps::new(
            |_cluster| future::ready(Ok(vec![NamespaceInfo::new("default", "Active")])),
            move |_cluster, _namespace| {
                f.hit();
                future::ready(Ok(items(&["a"])))
            },
        );
        let config = config().action(ActionDef::new("restart", "r", move |_item: TestItem, _ctx| {
            r.hit();
            future::ready(Ok(()))
        }));
        let (mut console, sink) = settled(ops, config).await;
        let id = ItemId::derive(5, "default", "a");

        let tasks = console.trigger_action("restart", &id).unwrap();
        assert_eq!(tasks.len(), 1);
        drive(&mut console, tasks).await;

        assert_eq!(restarts.get(), 1);
        assert_eq!(fetches.get(), 2);
        assert!(!console.is_busy());
        assert_eq!(sink.notices().last().map(|n| n.level), Some(NoticeLevel::Success));
        // Only confirmed effects are audited
        assert!(console.ctx.audit.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_item_is_an_error() {
        let (mut console, _) = settled(static_ops(&["default"], items(&["a"])), config()).await;
        let missing = ItemId::derive(5, "default", "zzz");
        assert!(matches!(
            console.trigger_action("delete", &missing),
            Err(ConsoleError::UnknownItem(_))
        ));
    }
}

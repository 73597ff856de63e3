//! Multi-item operations over the current selection

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use kubedeck_types::{ApiError, ItemId, ResourceItem, UserMessage};

use crate::error::{ConsoleError, ConsoleResult};
use crate::ops::{ApiFuture, DeleteMode, OpTarget, ResourceOps};

/// A verb applied to every selected item
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchVerb {
    Delete,
    Restart,
    Label(BTreeMap<String, String>),
}

impl BatchVerb {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Restart => "restart",
            Self::Label(_) => "label",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Delete => "Deleted",
            Self::Restart => "Restarted",
            Self::Label(_) => "Labeled",
        }
    }

    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Delete => "Deleting",
            Self::Restart => "Restarting",
            Self::Label(_) => "Labeling",
        }
    }
}

/// Batch verbs a resource type declares
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSupport {
    pub delete: bool,
    pub restart: bool,
    pub label: bool,
}

impl BatchSupport {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            delete: true,
            ..Self::default()
        }
    }

    pub fn with_restart(mut self) -> Self {
        self.restart = true;
        self
    }

    pub fn with_label(mut self) -> Self {
        self.label = true;
        self
    }

    pub fn supports(&self, verb: &BatchVerb) -> bool {
        match verb {
            BatchVerb::Delete => self.delete,
            BatchVerb::Restart => self.restart,
            BatchVerb::Label(_) => self.label,
        }
    }

    pub fn any(&self) -> bool {
        self.delete || self.restart || self.label
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,
    Failed(ApiError),
    NotAttempted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub id: ItemId,
    pub name: String,
    pub outcome: ItemOutcome,
}

/// Per-item outcome of one batch run, in selection order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub verb: &'static str,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Succeeded))
    }

    pub fn not_attempted(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::NotAttempted))
    }

    /// 1-based position, entry and error of the item that aborted the run
    pub fn failed_at(&self) -> Option<(usize, &BatchEntry, &ApiError)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(idx, entry)| match &entry.outcome {
                ItemOutcome::Failed(err) => Some((idx + 1, entry, err)),
                _ => None,
            })
    }

    pub fn is_success(&self) -> bool {
        self.failed_at().is_none()
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failed_at() {
            Some((position, entry, err)) => write!(
                f,
                "{} failed at item {} of {} ({}): {}",
                self.verb,
                position,
                self.total(),
                entry.name,
                err
            ),
            None => write!(f, "{} {} items", self.verb, self.total()),
        }
    }
}

/// A batch that did not complete
#[derive(Clone, Debug, Error)]
pub enum BatchFailure {
    /// Sequential run stopped at the first failing item
    #[error("{0}")]
    Aborted(BatchReport),

    /// The single bulk call failed; effect on individual items is unknown
    #[error("bulk {verb} of {total} items failed: {error}")]
    Bulk {
        verb: &'static str,
        total: usize,
        error: ApiError,
    },
}

impl BatchFailure {
    /// Whether remote state may have changed despite the failure
    pub fn needs_refresh(&self) -> bool {
        match self {
            Self::Aborted(report) => report.succeeded() > 0,
            Self::Bulk { .. } => true,
        }
    }

    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            Self::Aborted(report) => Some(report),
            Self::Bulk { .. } => None,
        }
    }
}

impl UserMessage for BatchFailure {
    fn user_message(&self) -> String {
        match self {
            Self::Aborted(report) => match report.failed_at() {
                Some((position, entry, err)) => format!(
                    "failed at item {} of {} ({}): {}",
                    position,
                    report.total(),
                    entry.name,
                    err.user_message()
                ),
                None => report.to_string(),
            },
            Self::Bulk { total, error, .. } => {
                format!("{} items: {}", total, error.user_message())
            }
        }
    }
}

type StepFn = Box<dyn Fn(OpTarget) -> ApiFuture<()> + Send + Sync>;

/// Runs batch verbs against one resource type's capabilities
pub struct BatchExecutor<T> {
    ops: ResourceOps<T>,
    support: BatchSupport,
    resource: String,
}

impl<T> Clone for BatchExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops.clone(),
            support: self.support,
            resource: self.resource.clone(),
        }
    }
}

impl<T: ResourceItem> BatchExecutor<T> {
    pub fn new(ops: ResourceOps<T>, support: BatchSupport, resource: impl Into<String>) -> Self {
        Self {
            ops,
            support,
            resource: resource.into(),
        }
    }

    /// Apply `verb` to `items`.
    ///
    /// A bulk capability for the verb is called once with every item. Without
    /// one, items run one at a time and the first failure stops the rest.
    pub async fn execute(
        &self,
        verb: &BatchVerb,
        items: Vec<T>,
        mode: DeleteMode,
    ) -> ConsoleResult<BatchReport> {
        if !self.support.supports(verb) {
            return Err(self.unsupported(verb));
        }
        if items.is_empty() {
            return Err(ConsoleError::EmptySelection);
        }

        info!(
            verb = verb.kind(),
            resource = %self.resource,
            count = items.len(),
            "running batch"
        );

        if let Some(bulk) = self.bulk_call(verb, &items, mode) {
            return match bulk.await {
                Ok(()) => Ok(BatchReport {
                    verb: verb.kind(),
                    entries: items
                        .iter()
                        .map(|item| entry(item, ItemOutcome::Succeeded))
                        .collect(),
                }),
                Err(error) => {
                    warn!(
                        verb = verb.kind(),
                        resource = %self.resource,
                        %error,
                        "bulk call failed"
                    );
                    Err(BatchFailure::Bulk {
                        verb: verb.kind(),
                        total: items.len(),
                        error,
                    }
                    .into())
                }
            };
        }

        let step = self.step(verb, mode)?;
        let mut entries = Vec::with_capacity(items.len());
        let mut aborted = false;

        for item in &items {
            if aborted {
                entries.push(entry(item, ItemOutcome::NotAttempted));
                continue;
            }
            match step(OpTarget::of(item)).await {
                Ok(()) => entries.push(entry(item, ItemOutcome::Succeeded)),
                Err(err) => {
                    warn!(
                        verb = verb.kind(),
                        resource = %self.resource,
                        item = item.name(),
                        error = %err,
                        "batch item failed, aborting"
                    );
                    entries.push(entry(item, ItemOutcome::Failed(err)));
                    aborted = true;
                }
            }
        }

        let report = BatchReport {
            verb: verb.kind(),
            entries,
        };
        if aborted {
            Err(BatchFailure::Aborted(report).into())
        } else {
            Ok(report)
        }
    }

    fn bulk_call(&self, verb: &BatchVerb, items: &[T], mode: DeleteMode) -> Option<ApiFuture<()>> {
        match verb {
            BatchVerb::Delete => self
                .ops
                .batch_delete
                .as_ref()
                .map(|bulk| bulk(items.to_vec(), mode)),
            BatchVerb::Restart => self
                .ops
                .batch_restart
                .as_ref()
                .map(|bulk| bulk(items.to_vec())),
            BatchVerb::Label(_) => None,
        }
    }

    fn step(&self, verb: &BatchVerb, mode: DeleteMode) -> ConsoleResult<StepFn> {
        let step: Option<StepFn> = match verb {
            BatchVerb::Delete => self.ops.delete.clone().map(|delete| -> StepFn {
                Box::new(move |target: OpTarget| delete(target, mode))
            }),
            BatchVerb::Restart => self
                .ops
                .restart
                .clone()
                .map(|restart| -> StepFn { Box::new(move |target: OpTarget| restart(target)) }),
            BatchVerb::Label(labels) => {
                let labels = labels.clone();
                self.ops.label.clone().map(|label| -> StepFn {
                    Box::new(move |target: OpTarget| label(target, labels.clone()))
                })
            }
        };
        step.ok_or_else(|| self.unsupported(verb))
    }

    fn unsupported(&self, verb: &BatchVerb) -> ConsoleError {
        ConsoleError::UnsupportedVerb {
            verb: verb.kind(),
            resource: self.resource.clone(),
        }
    }
}

fn entry<T: ResourceItem>(item: &T, outcome: ItemOutcome) -> BatchEntry {
    BatchEntry {
        id: item.id(),
        name: item.name().to_string(),
        outcome,
    }
}

static LABEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").expect("label name pattern")
});

static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("label prefix pattern")
});

/// Parse `key=value[,key=value...]` into a label map.
///
/// Keys are `[prefix/]name` with a DNS-subdomain prefix; names and values are
/// at most 63 characters of alphanumerics, `-`, `_` and `.`. Values may be empty.
pub fn parse_label_spec(spec: &str) -> ConsoleResult<BTreeMap<String, String>> {
    let valid_name = |s: &str| s.len() <= 63 && LABEL_NAME.is_match(s);

    let mut labels = BTreeMap::new();
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ConsoleError::InvalidLabel(format!(
                "'{}' is not key=value",
                pair
            )));
        };
        let (key, value) = (key.trim(), value.trim());

        let name = match key.split_once('/') {
            Some((prefix, name)) => {
                if prefix.len() > 253 || !LABEL_PREFIX.is_match(prefix) {
                    return Err(ConsoleError::InvalidLabel(format!(
                        "invalid key prefix '{}'",
                        prefix
                    )));
                }
                name
            }
            None => key,
        };
        if !valid_name(name) {
            return Err(ConsoleError::InvalidLabel(format!("invalid key '{}'", key)));
        }
        if !value.is_empty() && !valid_name(value) {
            return Err(ConsoleError::InvalidLabel(format!(
                "invalid value '{}'",
                value
            )));
        }
        labels.insert(key.to_string(), value.to_string());
    }

    if labels.is_empty() {
        return Err(ConsoleError::InvalidLabel("no labels given".to_string()));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Counter, TestItem, items, static_ops};
    use futures::future;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn failing_on(name: &'static str, calls: Arc<Mutex<Vec<String>>>) -> ResourceOps<TestItem> {
        static_ops(&["default"], Vec::new()).with_delete(move |target: OpTarget, _mode| {
            calls.lock().push(target.name.clone());
            if target.name == name {
                future::ready(Err(ApiError::backend(403, "Forbidden", "denied")))
            } else {
                future::ready(Ok(()))
            }
        })
    }

    #[tokio::test]
    async fn test_sequential_delete_aborts_at_first_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ops = failing_on("y", calls.clone());
        let executor = BatchExecutor::new(ops, BatchSupport::delete(), "deployment");

        let result = executor
            .execute(&BatchVerb::Delete, items(&["x", "y", "z"]), DeleteMode::Graceful)
            .await;

        assert_eq!(*calls.lock(), ["x", "y"]);
        let Err(ConsoleError::Batch(failure)) = result else {
            panic!("expected batch failure");
        };
        let report = failure.report().expect("aborted run has a report");
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.not_attempted(), 1);
        let (position, entry, _) = report.failed_at().expect("failure recorded");
        assert_eq!(position, 2);
        assert_eq!(entry.name, "y");
        assert!(failure.needs_refresh());
        assert_eq!(failure.user_message(), "failed at item 2 of 3 (y): denied");
    }

    #[tokio::test]
    async fn test_first_item_failure_needs_no_refresh() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ops = failing_on("x", calls.clone());
        let executor = BatchExecutor::new(ops, BatchSupport::delete(), "deployment");

        let result = executor
            .execute(&BatchVerb::Delete, items(&["x", "y"]), DeleteMode::Graceful)
            .await;
        let Err(ConsoleError::Batch(failure)) = result else {
            panic!("expected batch failure");
        };
        assert!(!failure.needs_refresh());
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_capability_is_called_once() {
        let bulk = Counter::default();
        let single = Counter::default();
        let (b, s) = (bulk.clone(), single.clone());
        let ops = static_ops(&["default"], Vec::new())
            .with_restart(move |_target| {
                s.hit();
                future::ready(Ok(()))
            })
            .with_batch_restart(move |items: Vec<TestItem>| {
                b.hit();
                assert_eq!(items.len(), 3);
                future::ready(Ok(()))
            });
        let executor = BatchExecutor::new(ops, BatchSupport::none().with_restart(), "deployment");

        let report = executor
            .execute(&BatchVerb::Restart, items(&["a", "b", "c"]), DeleteMode::Graceful)
            .await
            .expect("bulk restart succeeds");

        assert_eq!(report.succeeded(), 3);
        assert_eq!(bulk.get(), 1);
        assert_eq!(single.get(), 0);
    }

    #[tokio::test]
    async fn test_bulk_failure_is_total() {
        let ops = static_ops(&["default"], Vec::new()).with_batch_delete(
            |_items: Vec<TestItem>, _mode| {
                future::ready(Err(ApiError::Transport("reset".to_string())))
            },
        );
        let executor = BatchExecutor::new(ops, BatchSupport::delete(), "pod");

        let result = executor
            .execute(&BatchVerb::Delete, items(&["a", "b"]), DeleteMode::Immediate)
            .await;
        let Err(ConsoleError::Batch(failure @ BatchFailure::Bulk { .. })) = result else {
            panic!("expected bulk failure");
        };
        assert!(failure.needs_refresh());
        assert_eq!(failure.user_message(), "2 items: could not reach the cluster");
    }

    #[tokio::test]
    async fn test_delete_mode_reaches_capability() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let ops = static_ops(&["default"], Vec::new()).with_delete(move |_target, mode| {
            *sink.lock() = Some(mode);
            future::ready(Ok(()))
        });
        let executor = BatchExecutor::new(ops, BatchSupport::delete(), "pod");
        executor
            .execute(&BatchVerb::Delete, items(&["a"]), DeleteMode::Immediate)
            .await
            .expect("delete succeeds");
        assert_eq!(*seen.lock(), Some(DeleteMode::Immediate));
    }

    #[tokio::test]
    async fn test_undeclared_verb_is_rejected() {
        let ops = static_ops(&["default"], Vec::new())
            .with_restart(|_target| future::ready(Ok(())));
        let executor = BatchExecutor::new(ops, BatchSupport::delete(), "job");

        let result = executor
            .execute(&BatchVerb::Restart, items(&["a"]), DeleteMode::Graceful)
            .await;
        assert!(matches!(
            result,
            Err(ConsoleError::UnsupportedVerb { verb: "restart", .. })
        ));
    }

    #[tokio::test]
    async fn test_declared_verb_without_capability_is_rejected() {
        let executor = BatchExecutor::new(
            static_ops(&["default"], Vec::new()),
            BatchSupport::delete(),
            "job",
        );
        let result = executor
            .execute(&BatchVerb::Delete, items(&["a"]), DeleteMode::Graceful)
            .await;
        assert!(matches!(result, Err(ConsoleError::UnsupportedVerb { .. })));
    }

    #[tokio::test]
    async fn test_label_passes_map() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ops = static_ops(&["default"], Vec::new()).with_label(
            move |target: OpTarget, labels: BTreeMap<String, String>| {
                sink.lock().push((target.name, labels));
                future::ready(Ok(()))
            },
        );
        let executor = BatchExecutor::new(ops, BatchSupport::none().with_label(), "deployment");
        let labels = parse_label_spec("team=payments").expect("valid label");

        executor
            .execute(&BatchVerb::Label(labels), items(&["a", "b"]), DeleteMode::Graceful)
            .await
            .expect("label succeeds");

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1.get("team").map(String::as_str), Some("payments"));
    }

    #[test]
    fn test_parse_label_spec() {
        let labels = parse_label_spec("app=web, example.com/tier=frontend,empty=").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels["example.com/tier"], "frontend");
        assert_eq!(labels["empty"], "");

        assert!(parse_label_spec("").is_err());
        assert!(parse_label_spec("novalue").is_err());
        assert!(parse_label_spec("-bad=x").is_err());
        assert!(parse_label_spec("Bad_Prefix/app=x").is_err());
        assert!(parse_label_spec("app=has space").is_err());
        assert!(parse_label_spec(&format!("{}=x", "a".repeat(64))).is_err());
    }
}

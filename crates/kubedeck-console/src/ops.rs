//! Capabilities a resource type hands to its console
//!
//! The API-client layer provides these as plain closures; the console never
//! knows how a list or a delete is carried out.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use kubedeck_types::{ApiError, ClusterId, NamespaceInfo, ResourceItem};

pub type ApiFuture<T> = BoxFuture<'static, Result<T, ApiError>>;

pub type NamespacesFn = Arc<dyn Fn(ClusterId) -> ApiFuture<Vec<NamespaceInfo>> + Send + Sync>;
pub type FetchFn<T> = Arc<dyn Fn(ClusterId, Option<String>) -> ApiFuture<Vec<T>> + Send + Sync>;
pub type DeleteFn = Arc<dyn Fn(OpTarget, DeleteMode) -> ApiFuture<()> + Send + Sync>;
pub type RestartFn = Arc<dyn Fn(OpTarget) -> ApiFuture<()> + Send + Sync>;
pub type LabelFn = Arc<dyn Fn(OpTarget, BTreeMap<String, String>) -> ApiFuture<()> + Send + Sync>;
pub type BulkDeleteFn<T> = Arc<dyn Fn(Vec<T>, DeleteMode) -> ApiFuture<()> + Send + Sync>;
pub type BulkRestartFn<T> = Arc<dyn Fn(Vec<T>) -> ApiFuture<()> + Send + Sync>;

/// The object a single-item operation applies to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpTarget {
    pub cluster_id: ClusterId,
    /// Empty for cluster-scoped objects
    pub namespace: String,
    pub name: String,
}

impl OpTarget {
    pub fn of<T: ResourceItem>(item: &T) -> Self {
        Self {
            cluster_id: item.cluster_id(),
            namespace: item.namespace().to_string(),
            name: item.name().to_string(),
        }
    }
}

/// Deletion semantics, chosen by the force toggle of the confirmation dialog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeleteMode {
    #[default]
    Graceful,
    Immediate,
}

impl DeleteMode {
    pub fn from_force(force: bool) -> Self {
        if force { Self::Immediate } else { Self::Graceful }
    }
}

/// Capability set for one resource type
pub struct ResourceOps<T> {
    pub list_namespaces: NamespacesFn,
    pub fetch: FetchFn<T>,
    pub delete: Option<DeleteFn>,
    pub restart: Option<RestartFn>,
    pub label: Option<LabelFn>,
    pub batch_delete: Option<BulkDeleteFn<T>>,
    pub batch_restart: Option<BulkRestartFn<T>>,
}

impl<T> Clone for ResourceOps<T> {
    fn clone(&self) -> Self {
        Self {
            list_namespaces: Arc::clone(&self.list_namespaces),
            fetch: Arc::clone(&self.fetch),
            delete: self.delete.clone(),
            restart: self.restart.clone(),
            label: self.label.clone(),
            batch_delete: self.batch_delete.clone(),
            batch_restart: self.batch_restart.clone(),
        }
    }
}

impl<T: ResourceItem> ResourceOps<T> {
    pub fn new<N, NF, F, FF>(list_namespaces: N, fetch: F) -> Self
    where
        N: Fn(ClusterId) -> NF + Send + Sync + 'static,
        NF: Future<Output = Result<Vec<NamespaceInfo>, ApiError>> + Send + 'static,
        F: Fn(ClusterId, Option<String>) -> FF + Send + Sync + 'static,
        FF: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
    {
        Self {
            list_namespaces: Arc::new(move |cluster: ClusterId| list_namespaces(cluster).boxed()),
            fetch: Arc::new(move |cluster: ClusterId, namespace: Option<String>| {
                fetch(cluster, namespace).boxed()
            }),
            delete: None,
            restart: None,
            label: None,
            batch_delete: None,
            batch_restart: None,
        }
    }

    pub fn with_delete<D, DF>(mut self, delete: D) -> Self
    where
        D: Fn(OpTarget, DeleteMode) -> DF + Send + Sync + 'static,
        DF: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.delete = Some(Arc::new(move |target: OpTarget, mode: DeleteMode| {
            delete(target, mode).boxed()
        }));
        self
    }

    pub fn with_restart<R, RF>(mut self, restart: R) -> Self
    where
        R: Fn(OpTarget) -> RF + Send + Sync + 'static,
        RF: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.restart = Some(Arc::new(move |target: OpTarget| restart(target).boxed()));
        self
    }

    pub fn with_label<L, LF>(mut self, label: L) -> Self
    where
        L: Fn(OpTarget, BTreeMap<String, String>) -> LF + Send + Sync + 'static,
        LF: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.label = Some(Arc::new(
            move |target: OpTarget, labels: BTreeMap<String, String>| label(target, labels).boxed(),
        ));
        self
    }

    pub fn with_batch_delete<B, BF>(mut self, bulk: B) -> Self
    where
        B: Fn(Vec<T>, DeleteMode) -> BF + Send + Sync + 'static,
        BF: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.batch_delete = Some(Arc::new(move |items: Vec<T>, mode: DeleteMode| {
            bulk(items, mode).boxed()
        }));
        self
    }

    pub fn with_batch_restart<B, BF>(mut self, bulk: B) -> Self
    where
        B: Fn(Vec<T>) -> BF + Send + Sync + 'static,
        BF: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.batch_restart = Some(Arc::new(move |items: Vec<T>| bulk(items).boxed()));
        self
    }
}

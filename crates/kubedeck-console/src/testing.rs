//! Fixtures shared by the unit tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future;
use parking_lot::Mutex;

use kubedeck_types::{
    ApiError, ClusterInfo, FieldValue, ItemMeta, NamespaceInfo, ResourceItem, StatusTone,
};

use crate::console::{ConsoleEvent, ConsoleTask, ResourceConsole};
use crate::feedback::{Notice, NotificationSink};
use crate::ops::ResourceOps;

#[derive(Clone, Debug)]
pub struct TestItem {
    pub meta: ItemMeta,
    pub replicas: i32,
    pub owner: Option<String>,
    pub status: Option<String>,
}

impl TestItem {
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.meta.namespace = namespace.to_string();
        self
    }
}

impl ResourceItem for TestItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "replicas" => Some(FieldValue::Number(self.replicas.into())),
            "owner" => self.owner.as_deref().map(FieldValue::text),
            "status" => self.status.as_deref().map(FieldValue::text),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        StatusTone::Neutral
    }
}

pub fn cluster(id: u32) -> ClusterInfo {
    ClusterInfo::new(id, format!("cluster-{}", id), format!("ctx-{}", id), id == 1)
}

/// Item named `name` in cluster 5, namespace "default"
pub fn item(name: &str) -> TestItem {
    TestItem {
        meta: ItemMeta::new(&cluster(5), "default", name),
        replicas: 1,
        owner: None,
        status: None,
    }
}

pub fn items(names: &[&str]) -> Vec<TestItem> {
    names.iter().map(|n| item(n)).collect()
}

/// Sink that remembers every published notice
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Ops over a static namespace list and a fixed item list
pub fn static_ops(namespaces: &[&str], list: Vec<TestItem>) -> ResourceOps<TestItem> {
    let namespaces: Vec<NamespaceInfo> = namespaces
        .iter()
        .map(|n| NamespaceInfo::new(*n, "Active"))
        .collect();
    let list = Arc::new(list);
    ResourceOps::new(
        move |_cluster| future::ready(Ok::<_, ApiError>(namespaces.clone())),
        move |cluster, namespace: Option<String>| {
            let found: Vec<TestItem> = list
                .iter()
                .filter(|i| namespace.as_deref().is_none_or(|ns| i.namespace() == ns))
                .map(|i| {
                    let mut i = i.clone();
                    i.meta.cluster_id = cluster;
                    i
                })
                .collect();
            future::ready(Ok(found))
        },
    )
}

/// Counts invocations of a capability
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run tasks to completion, feeding every event back into the console
pub async fn drive<T: ResourceItem>(console: &mut ResourceConsole<T>, tasks: Vec<ConsoleTask<T>>) {
    let mut queue: VecDeque<ConsoleTask<T>> = tasks.into();
    while let Some(task) = queue.pop_front() {
        let event: ConsoleEvent<T> = task.await;
        queue.extend(console.handle(event));
    }
}

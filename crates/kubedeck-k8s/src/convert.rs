//! Conversion of Kubernetes objects into console items

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use kubedeck_types::{
    ClusterInfo, DaemonSetItem, DeploymentItem, HpaItem, ItemMeta, JobItem, NamespaceInfo,
    NetworkPolicyItem, PodItem, PodPhase, RoleBindingItem, RoleItem,
};

fn meta(cluster: &ClusterInfo, metadata: ObjectMeta) -> ItemMeta {
    ItemMeta::new(
        cluster,
        metadata.namespace.unwrap_or_default(),
        metadata.name.unwrap_or_default(),
    )
    .created_at(metadata.creation_timestamp.map(|t| t.0))
    .labels(metadata.labels.unwrap_or_default())
}

fn namespace(ns: Namespace) -> NamespaceInfo {
    let name = ns.metadata.name.unwrap_or_default();
    let status = ns
        .status
        .and_then(|s| s.phase)
        .unwrap_or_else(|| "Unknown".to_string());
    NamespaceInfo::new(name, status)
}

/// Namespaces in the order the API server listed them
pub fn namespaces(list: Vec<Namespace>) -> Vec<NamespaceInfo> {
    list.into_iter().map(namespace).collect()
}

pub fn deployment(cluster: &ClusterInfo, deploy: Deployment) -> DeploymentItem {
    let mut item = DeploymentItem::new(meta(cluster, deploy.metadata));

    if let Some(spec) = deploy.spec {
        item.replicas = spec.replicas.unwrap_or(1);
        item.images = spec
            .template
            .spec
            .map(|pod| pod.containers.into_iter().filter_map(|c| c.image).collect())
            .unwrap_or_default();
    }

    if let Some(status) = deploy.status {
        item.ready_replicas = status.ready_replicas.unwrap_or(0);
        item.available_replicas = status.available_replicas.unwrap_or(0);
        item.updated_replicas = status.updated_replicas.unwrap_or(0);
    }

    item
}

pub fn daemon_set(cluster: &ClusterInfo, ds: DaemonSet) -> DaemonSetItem {
    let mut item = DaemonSetItem::new(meta(cluster, ds.metadata));

    if let Some(status) = ds.status {
        item.desired = status.desired_number_scheduled;
        item.current = status.current_number_scheduled;
        item.ready = status.number_ready;
        item.updated = status.updated_number_scheduled.unwrap_or(0);
    }

    item
}

pub fn pod(cluster: &ClusterInfo, pod: Pod) -> PodItem {
    let mut item = PodItem::new(meta(cluster, pod.metadata));

    if let Some(spec) = &pod.spec {
        item.node_name = spec.node_name.clone();
        item.total_containers = spec.containers.len();
    }

    if let Some(status) = pod.status {
        item.pod_ip = status.pod_ip;
        item.phase = status
            .phase
            .as_deref()
            .map(PodPhase::from)
            .unwrap_or(PodPhase::Unknown);

        if let Some(containers) = status.container_statuses {
            item.ready_containers = containers.iter().filter(|c| c.ready).count();
            item.restarts = containers.iter().map(|c| c.restart_count).sum();
        }
    }

    item
}

pub fn job(cluster: &ClusterInfo, job: Job) -> JobItem {
    let mut item = JobItem::new(meta(cluster, job.metadata));

    if let Some(completions) = job.spec.and_then(|s| s.completions) {
        item.completions = completions;
    }

    if let Some(status) = job.status {
        item.succeeded = status.succeeded.unwrap_or(0);
        item.failed = status.failed.unwrap_or(0);
        item.active = status.active.unwrap_or(0);
    }

    item
}

pub fn hpa(cluster: &ClusterInfo, hpa: HorizontalPodAutoscaler) -> HpaItem {
    let mut item = HpaItem::new(meta(cluster, hpa.metadata));

    if let Some(spec) = hpa.spec {
        item.target_kind = spec.scale_target_ref.kind;
        item.target_name = spec.scale_target_ref.name;
        item.min_replicas = spec.min_replicas.unwrap_or(1);
        item.max_replicas = spec.max_replicas;
    }

    if let Some(status) = hpa.status {
        item.current_replicas = status.current_replicas.unwrap_or(0);
        item.desired_replicas = status.desired_replicas;
    }

    item
}

pub fn role(cluster: &ClusterInfo, role: Role) -> RoleItem {
    let mut item = RoleItem::new(meta(cluster, role.metadata));
    item.rule_count = role.rules.map(|r| r.len()).unwrap_or(0);
    item
}

pub fn cluster_role(cluster: &ClusterInfo, role: ClusterRole) -> RoleItem {
    let mut item = RoleItem::new(meta(cluster, role.metadata));
    item.rule_count = role.rules.map(|r| r.len()).unwrap_or(0);
    item
}

pub fn role_binding(cluster: &ClusterInfo, binding: RoleBinding) -> RoleBindingItem {
    let role = role_ref(&binding.role_ref);
    let mut item = RoleBindingItem::new(meta(cluster, binding.metadata), role);
    item.subjects = subjects(binding.subjects);
    item
}

pub fn cluster_role_binding(cluster: &ClusterInfo, binding: ClusterRoleBinding) -> RoleBindingItem {
    let role = role_ref(&binding.role_ref);
    let mut item = RoleBindingItem::new(meta(cluster, binding.metadata), role);
    item.subjects = subjects(binding.subjects);
    item
}

fn role_ref(role_ref: &RoleRef) -> String {
    format!("{}/{}", role_ref.kind, role_ref.name)
}

fn subjects(subjects: Option<Vec<Subject>>) -> Vec<String> {
    subjects
        .unwrap_or_default()
        .into_iter()
        .map(|s| format!("{}:{}", s.kind, s.name))
        .collect()
}

pub fn network_policy(cluster: &ClusterInfo, policy: NetworkPolicy) -> NetworkPolicyItem {
    let mut item = NetworkPolicyItem::new(meta(cluster, policy.metadata));

    if let Some(spec) = policy.spec {
        item.pod_selector = selector(&spec.pod_selector);
        item.policy_types = spec.policy_types.unwrap_or_default();
    }

    item
}

/// Render a label selector the way kubectl does; empty selects every pod
fn selector(selector: &LabelSelector) -> String {
    let mut parts: Vec<String> = selector
        .match_labels
        .iter()
        .flatten()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    for expr in selector.match_expressions.iter().flatten() {
        let values = expr.values.as_deref().unwrap_or_default().join(",");
        parts.push(format!("{} {} ({})", expr.key, expr.operator.to_lowercase(), values));
    }
    if parts.is_empty() {
        "<all pods>".to_string()
    } else {
        parts.join(",")
    }
}

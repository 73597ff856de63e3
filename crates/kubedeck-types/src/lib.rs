//! Shared types for kubedeck
//!
//! This crate contains the data structures used across the console core, the
//! Kubernetes client and the terminal UI.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use ratatui::style::Color;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Clusters and Namespaces
// ============================================================================

/// Numeric cluster identity. Always positive; derived from kubeconfig order.
pub type ClusterId = u32;

/// A cluster the console can operate on (one kubeconfig context)
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    pub id: ClusterId,
    pub name: String,
    pub context: String,
    pub server: Option<String>,
    pub namespace: Option<String>,
    pub is_current: bool,
}

impl ClusterInfo {
    pub fn new(id: ClusterId, name: String, context: String, is_current: bool) -> Self {
        Self {
            id,
            name,
            context,
            server: None,
            namespace: None,
            is_current,
        }
    }
}

/// Namespace information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub name: String,
    pub status: String,
}

impl NamespaceInfo {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

// ============================================================================
// Resource Items
// ============================================================================

/// Stable identity of a listed item, derived from `(cluster, namespace, name)`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn derive(cluster_id: ClusterId, namespace: &str, name: &str) -> Self {
        Self(format!("{}/{}/{}", cluster_id, namespace, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named field value exposed for searching and status filtering
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(i64),
    Flag(bool),
}

impl<'a> FieldValue<'a> {
    pub fn text(s: &'a str) -> Self {
        Self::Text(Cow::Borrowed(s))
    }

    pub fn owned(s: String) -> Self {
        Self::Text(Cow::Owned(s))
    }

    /// The string content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Metadata every listed resource carries
#[derive(Clone, Debug, Default)]
pub struct ItemMeta {
    pub name: String,
    /// Empty for cluster-scoped objects
    pub namespace: String,
    pub cluster_id: ClusterId,
    pub cluster_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub labels: HashMap<String, String>,
}

impl ItemMeta {
    pub fn new(
        cluster: &ClusterInfo,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            cluster_id: cluster.id,
            cluster_name: cluster.name.clone(),
            created_at: None,
            labels: HashMap::new(),
        }
    }

    pub fn created_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.created_at = at;
        self
    }

    pub fn labels<I>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.labels = labels.into_iter().collect();
        self
    }

    /// Age relative to now, kubectl style
    pub fn age(&self) -> String {
        self.age_at(Utc::now())
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> String {
        match self.created_at {
            Some(created) => format_age(now - created),
            None => "-".to_string(),
        }
    }

    /// Fields shared by all item types
    pub fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "name" => Some(FieldValue::text(&self.name)),
            "namespace" => Some(FieldValue::text(&self.namespace)),
            "cluster" => Some(FieldValue::text(&self.cluster_name)),
            _ => None,
        }
    }
}

/// Format a duration the way kubectl prints resource ages
pub fn format_age(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

/// Coarse health of a row, used for coloring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusTone {
    Healthy,
    Progressing,
    Failed,
    #[default]
    Neutral,
}

impl StatusTone {
    pub fn color(&self) -> Color {
        match self {
            Self::Healthy => Color::Green,
            Self::Progressing => Color::Yellow,
            Self::Failed => Color::Red,
            Self::Neutral => Color::White,
        }
    }
}

/// A record the console can list, filter, select and act on
pub trait ResourceItem: Clone + Send + Sync + 'static {
    fn meta(&self) -> &ItemMeta;

    /// Look up a named field. Implementations fall back to [`ItemMeta::field`].
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        self.meta().field(key)
    }

    fn tone(&self) -> StatusTone {
        StatusTone::Neutral
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn namespace(&self) -> &str {
        &self.meta().namespace
    }

    fn cluster_id(&self) -> ClusterId {
        self.meta().cluster_id
    }

    fn cluster_name(&self) -> &str {
        &self.meta().cluster_name
    }

    fn age(&self) -> String {
        self.meta().age()
    }

    fn labels(&self) -> &HashMap<String, String> {
        &self.meta().labels
    }

    fn id(&self) -> ItemId {
        let meta = self.meta();
        ItemId::derive(meta.cluster_id, &meta.namespace, &meta.name)
    }
}

/// Deployment information
#[derive(Clone, Debug)]
pub struct DeploymentItem {
    pub meta: ItemMeta,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub updated_replicas: i32,
    pub images: Vec<String>,
}

impl DeploymentItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            replicas: 0,
            ready_replicas: 0,
            available_replicas: 0,
            updated_replicas: 0,
            images: Vec::new(),
        }
    }

    /// Format replica status as "ready/total"
    pub fn replica_status(&self) -> String {
        format!("{}/{}", self.ready_replicas, self.replicas)
    }

    pub fn status(&self) -> &'static str {
        if self.replicas == 0 {
            "Stopped"
        } else if self.ready_replicas >= self.replicas {
            "Ready"
        } else if self.available_replicas == 0 {
            "Unavailable"
        } else {
            "Progressing"
        }
    }
}

impl ResourceItem for DeploymentItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "status" => Some(FieldValue::text(self.status())),
            "images" => Some(FieldValue::owned(self.images.join(","))),
            "replicas" => Some(FieldValue::Number(self.replicas.into())),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        match self.status() {
            "Ready" => StatusTone::Healthy,
            "Unavailable" => StatusTone::Failed,
            "Progressing" => StatusTone::Progressing,
            _ => StatusTone::Neutral,
        }
    }
}

/// DaemonSet information
#[derive(Clone, Debug)]
pub struct DaemonSetItem {
    pub meta: ItemMeta,
    pub desired: i32,
    pub current: i32,
    pub ready: i32,
    pub updated: i32,
}

impl DaemonSetItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            desired: 0,
            current: 0,
            ready: 0,
            updated: 0,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.desired == 0 {
            "Idle"
        } else if self.ready >= self.desired && self.updated >= self.desired {
            "Ready"
        } else {
            "Progressing"
        }
    }
}

impl ResourceItem for DaemonSetItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "status" => Some(FieldValue::text(self.status())),
            "desired" => Some(FieldValue::Number(self.desired.into())),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        match self.status() {
            "Ready" => StatusTone::Healthy,
            "Progressing" => StatusTone::Progressing,
            _ => StatusTone::Neutral,
        }
    }
}

/// Pod lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<&str> for PodPhase {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Pod information
#[derive(Clone, Debug)]
pub struct PodItem {
    pub meta: ItemMeta,
    pub phase: PodPhase,
    pub ready_containers: usize,
    pub total_containers: usize,
    pub restarts: i32,
    pub node_name: Option<String>,
    pub pod_ip: Option<String>,
}

impl PodItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            phase: PodPhase::Unknown,
            ready_containers: 0,
            total_containers: 0,
            restarts: 0,
            node_name: None,
            pod_ip: None,
        }
    }

    pub fn ready_status(&self) -> String {
        format!("{}/{}", self.ready_containers, self.total_containers)
    }
}

impl ResourceItem for PodItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "status" => Some(FieldValue::text(self.phase.as_str())),
            "node" => self.node_name.as_deref().map(FieldValue::text),
            "ip" => self.pod_ip.as_deref().map(FieldValue::text),
            "restarts" => Some(FieldValue::Number(self.restarts.into())),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        match self.phase {
            PodPhase::Running | PodPhase::Succeeded => StatusTone::Healthy,
            PodPhase::Pending => StatusTone::Progressing,
            PodPhase::Failed => StatusTone::Failed,
            PodPhase::Unknown => StatusTone::Neutral,
        }
    }
}

/// Job information
#[derive(Clone, Debug)]
pub struct JobItem {
    pub meta: ItemMeta,
    pub completions: i32,
    pub succeeded: i32,
    pub failed: i32,
    pub active: i32,
}

impl JobItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            completions: 1,
            succeeded: 0,
            failed: 0,
            active: 0,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.failed > 0 && self.active == 0 && self.succeeded < self.completions {
            "Failed"
        } else if self.succeeded >= self.completions {
            "Complete"
        } else if self.active > 0 {
            "Running"
        } else {
            "Pending"
        }
    }

    pub fn completion_status(&self) -> String {
        format!("{}/{}", self.succeeded, self.completions)
    }
}

impl ResourceItem for JobItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "status" => Some(FieldValue::text(self.status())),
            "completions" => Some(FieldValue::owned(self.completion_status())),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        match self.status() {
            "Complete" => StatusTone::Healthy,
            "Failed" => StatusTone::Failed,
            _ => StatusTone::Progressing,
        }
    }
}

/// HorizontalPodAutoscaler information
#[derive(Clone, Debug)]
pub struct HpaItem {
    pub meta: ItemMeta,
    pub target_kind: String,
    pub target_name: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub current_replicas: i32,
    pub desired_replicas: i32,
}

impl HpaItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            target_kind: String::new(),
            target_name: String::new(),
            min_replicas: 1,
            max_replicas: 1,
            current_replicas: 0,
            desired_replicas: 0,
        }
    }

    pub fn target(&self) -> String {
        format!("{}/{}", self.target_kind, self.target_name)
    }
}

impl ResourceItem for HpaItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "target" => Some(FieldValue::owned(self.target())),
            "replicas" => Some(FieldValue::Number(self.current_replicas.into())),
            _ => self.meta.field(key),
        }
    }

    fn tone(&self) -> StatusTone {
        if self.current_replicas >= self.max_replicas {
            StatusTone::Progressing
        } else {
            StatusTone::Neutral
        }
    }
}

/// Role or ClusterRole (cluster-scoped when the namespace is empty)
#[derive(Clone, Debug)]
pub struct RoleItem {
    pub meta: ItemMeta,
    pub rule_count: usize,
}

impl RoleItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            rule_count: 0,
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.meta.namespace.is_empty()
    }

    pub fn scope_label(&self) -> &'static str {
        if self.is_cluster_scoped() {
            "Cluster"
        } else {
            "Namespace"
        }
    }
}

impl ResourceItem for RoleItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "scope" => Some(FieldValue::text(self.scope_label())),
            "rules" => Some(FieldValue::Number(self.rule_count as i64)),
            _ => self.meta.field(key),
        }
    }
}

/// RoleBinding or ClusterRoleBinding (cluster-scoped when the namespace is empty)
#[derive(Clone, Debug)]
pub struct RoleBindingItem {
    pub meta: ItemMeta,
    pub role_ref: String,
    pub subjects: Vec<String>,
}

impl RoleBindingItem {
    pub fn new(meta: ItemMeta, role_ref: String) -> Self {
        Self {
            meta,
            role_ref,
            subjects: Vec::new(),
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.meta.namespace.is_empty()
    }
}

impl ResourceItem for RoleBindingItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "role" => Some(FieldValue::text(&self.role_ref)),
            "subjects" => Some(FieldValue::owned(self.subjects.join(", "))),
            _ => self.meta.field(key),
        }
    }
}

/// NetworkPolicy information
#[derive(Clone, Debug)]
pub struct NetworkPolicyItem {
    pub meta: ItemMeta,
    pub pod_selector: String,
    pub policy_types: Vec<String>,
}

impl NetworkPolicyItem {
    pub fn new(meta: ItemMeta) -> Self {
        Self {
            meta,
            pod_selector: String::new(),
            policy_types: Vec::new(),
        }
    }
}

impl ResourceItem for NetworkPolicyItem {
    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "selector" => Some(FieldValue::text(&self.pod_selector)),
            "types" => Some(FieldValue::owned(self.policy_types.join(","))),
            _ => self.meta.field(key),
        }
    }
}

// ============================================================================
// Resource Kinds
// ============================================================================

/// The resource types the console can manage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Deployments,
    DaemonSets,
    Pods,
    Jobs,
    #[serde(alias = "hpa")]
    Hpas,
    Roles,
    RoleBindings,
    NetworkPolicies,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        Self::Deployments,
        Self::DaemonSets,
        Self::Pods,
        Self::Jobs,
        Self::Hpas,
        Self::Roles,
        Self::RoleBindings,
        Self::NetworkPolicies,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Deployments => "Deployments",
            Self::DaemonSets => "DaemonSets",
            Self::Pods => "Pods",
            Self::Jobs => "Jobs",
            Self::Hpas => "HPAs",
            Self::Roles => "Roles",
            Self::RoleBindings => "RoleBindings",
            Self::NetworkPolicies => "NetworkPolicies",
        }
    }

    /// Lowercase singular noun for messages
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Deployments => "deployment",
            Self::DaemonSets => "daemonset",
            Self::Pods => "pod",
            Self::Jobs => "job",
            Self::Hpas => "hpa",
            Self::Roles => "role",
            Self::RoleBindings => "rolebinding",
            Self::NetworkPolicies => "networkpolicy",
        }
    }

    /// Cycle to the next kind
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Cycle to the previous kind
    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deployments" | "deployment" | "deploy" => Ok(Self::Deployments),
            "daemonsets" | "daemonset" | "ds" => Ok(Self::DaemonSets),
            "pods" | "pod" | "po" => Ok(Self::Pods),
            "jobs" | "job" => Ok(Self::Jobs),
            "hpas" | "hpa" => Ok(Self::Hpas),
            "roles" | "role" => Ok(Self::Roles),
            "rolebindings" | "rolebinding" => Ok(Self::RoleBindings),
            "networkpolicies" | "networkpolicy" | "netpol" => Ok(Self::NetworkPolicies),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure reported by the remote resource store
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API server answered with an error status
    #[error("{reason} ({code}): {message}")]
    Backend {
        code: u16,
        reason: String,
        message: String,
    },

    /// The request never produced an API response
    #[error("transport error: {0}")]
    Transport(String),

    #[error("cluster {0} is not configured")]
    UnknownCluster(ClusterId),

    /// Rejected client-side before any request was sent
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn backend(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend { code: 404, .. })
    }
}

/// Short, human-readable text for a failure
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for ApiError {
    fn user_message(&self) -> String {
        match self {
            Self::Backend {
                reason, message, ..
            } => {
                if message.is_empty() {
                    reason.clone()
                } else {
                    message.clone()
                }
            }
            Self::Transport(_) => "could not reach the cluster".to_string(),
            Self::UnknownCluster(_) | Self::Rejected(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> ClusterInfo {
        ClusterInfo::new(5, "prod".to_string(), "prod-admin".to_string(), true)
    }

    #[test]
    fn test_item_id_is_derived_from_scope_and_name() {
        let item = DeploymentItem::new(ItemMeta::new(&cluster(), "default", "web"));
        assert_eq!(item.id(), ItemId::derive(5, "default", "web"));
        assert_eq!(item.id().as_str(), "5/default/web");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(42)), "42s");
        assert_eq!(format_age(Duration::minutes(12)), "12m");
        assert_eq!(format_age(Duration::hours(3)), "3h");
        assert_eq!(format_age(Duration::days(9)), "9d");
        assert_eq!(format_age(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_age_without_timestamp() {
        let meta = ItemMeta::new(&cluster(), "default", "web");
        assert_eq!(meta.age(), "-");
    }

    #[test]
    fn test_deployment_status() {
        let mut item = DeploymentItem::new(ItemMeta::new(&cluster(), "default", "web"));
        assert_eq!(item.status(), "Stopped");

        item.replicas = 3;
        item.ready_replicas = 1;
        item.available_replicas = 1;
        assert_eq!(item.status(), "Progressing");
        assert_eq!(item.tone(), StatusTone::Progressing);

        item.ready_replicas = 3;
        assert_eq!(item.status(), "Ready");
        assert_eq!(item.replica_status(), "3/3");
    }

    #[test]
    fn test_non_text_fields_are_not_text() {
        let mut item = PodItem::new(ItemMeta::new(&cluster(), "default", "web-0"));
        item.restarts = 4;
        assert_eq!(item.field("restarts"), Some(FieldValue::Number(4)));
        assert!(item.field("restarts").unwrap().as_text().is_none());
        assert_eq!(item.field("name").unwrap().as_text(), Some("web-0"));
        assert_eq!(item.field("node"), None);
    }

    #[test]
    fn test_resource_kind_parse_and_cycle() {
        assert_eq!("deploy".parse::<ResourceKind>(), Ok(ResourceKind::Deployments));
        assert_eq!("HPA".parse::<ResourceKind>(), Ok(ResourceKind::Hpas));
        assert!("widgets".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::NetworkPolicies.next(), ResourceKind::Deployments);
        assert_eq!(ResourceKind::Deployments.prev(), ResourceKind::NetworkPolicies);
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = ApiError::backend(403, "Forbidden", "deployments.apps \"web\" is forbidden");
        assert_eq!(err.user_message(), "deployments.apps \"web\" is forbidden");

        let err = ApiError::Transport("tcp connect error: connection refused".to_string());
        assert_eq!(err.user_message(), "could not reach the cluster");
    }
}

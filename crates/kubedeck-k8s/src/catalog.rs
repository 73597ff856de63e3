//! Per-kind console definitions backed by the Kubernetes client

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::try_join_all;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::Resource;
use serde::de::DeserializeOwned;

use kubedeck_console::ops::{ApiFuture, DeleteFn, LabelFn, RestartFn};
use kubedeck_console::{
    ActionContext, ActionDef, BatchSupport, ColumnDef, ConsoleConfig, ConsoleContext, ConsoleView,
    DeleteMode, FeedbackLabels, OpTarget, ResourceConsole, ResourceOps, SortKey,
};
use kubedeck_types::{
    ClusterId, ClusterInfo, DaemonSetItem, DeploymentItem, HpaItem, JobItem, NamespaceInfo,
    NetworkPolicyItem, PodItem, ResourceItem, ResourceKind, RoleBindingItem, RoleItem,
};

use crate::client::KubeClient;
use crate::convert;

/// Open the console for one resource kind
pub fn open_console(
    kind: ResourceKind,
    client: &KubeClient,
    ctx: ConsoleContext,
) -> Box<dyn ConsoleView> {
    match kind {
        ResourceKind::Deployments => boxed(deployments(client), ctx),
        ResourceKind::DaemonSets => boxed(daemon_sets(client), ctx),
        ResourceKind::Pods => boxed(pods(client), ctx),
        ResourceKind::Jobs => boxed(jobs(client), ctx),
        ResourceKind::Hpas => boxed(hpas(client), ctx),
        ResourceKind::Roles => boxed(roles(client), ctx),
        ResourceKind::RoleBindings => boxed(role_bindings(client), ctx),
        ResourceKind::NetworkPolicies => boxed(network_policies(client), ctx),
    }
}

fn boxed<T: ResourceItem>(
    (config, ops): (ConsoleConfig<T>, ResourceOps<T>),
    ctx: ConsoleContext,
) -> Box<dyn ConsoleView> {
    Box::new(ResourceConsole::new(config, ops, ctx))
}

pub fn deployments(
    client: &KubeClient,
) -> (ConsoleConfig<DeploymentItem>, ResourceOps<DeploymentItem>) {
    let delete = namespaced_delete::<Deployment>(client);
    let restart = namespaced_restart::<Deployment>(client);

    let mut ops = ResourceOps::new(
        namespace_lister(client),
        namespaced_fetch(client, convert::deployment),
    )
    .with_batch_restart(concurrent_restart(restart.clone()));
    ops.delete = Some(delete.clone());
    ops.restart = Some(restart.clone());
    ops.label = Some(namespaced_label::<Deployment>(client));

    let kind = ResourceKind::Deployments;
    let config = ConsoleConfig::new(kind.title(), kind.noun())
        .column(name_column())
        .column(ColumnDef::new("ready", "READY", |d: &DeploymentItem| d.replica_status()).width(7))
        .column(
            ColumnDef::new("updated", "UP-TO-DATE", |d: &DeploymentItem| {
                d.updated_replicas.to_string()
            })
            .width(10)
            .sort_by(|d| SortKey::Number(d.updated_replicas.into())),
        )
        .column(
            ColumnDef::new("available", "AVAILABLE", |d: &DeploymentItem| {
                d.available_replicas.to_string()
            })
            .width(9)
            .sort_by(|d| SortKey::Number(d.available_replicas.into())),
        )
        .column(
            ColumnDef::new("status", "STATUS", |d: &DeploymentItem| d.status().to_string())
                .width(11)
                .sortable(),
        )
        .column(age_column())
        .column(
            ColumnDef::new("images", "IMAGES", |d: &DeploymentItem| d.images.join(",")).width(32),
        )
        .action(
            restart_action("deployment", restart)
                .disabled_when(|d: &DeploymentItem| d.replicas == 0),
        )
        .action(delete_action("deployment", delete))
        .search(&["name", "images", "status"])
        .status_filter("status", &["Ready", "Progressing", "Unavailable", "Stopped"])
        .batch(BatchSupport::delete().with_restart().with_label());

    (config, ops)
}

pub fn daemon_sets(
    client: &KubeClient,
) -> (ConsoleConfig<DaemonSetItem>, ResourceOps<DaemonSetItem>) {
    let delete = namespaced_delete::<DaemonSet>(client);
    let restart = namespaced_restart::<DaemonSet>(client);

    let mut ops = ResourceOps::new(
        namespace_lister(client),
        namespaced_fetch(client, convert::daemon_set),
    );
    ops.delete = Some(delete.clone());
    ops.restart = Some(restart.clone());

    let count = |value: fn(&DaemonSetItem) -> i32| move |d: &DaemonSetItem| value(d).to_string();
    let kind = ResourceKind::DaemonSets;
    let config = ConsoleConfig::new(kind.title(), kind.noun())
        .column(name_column())
        .column(ColumnDef::new("desired", "DESIRED", count(|d| d.desired)).width(8))
        .column(ColumnDef::new("current", "CURRENT", count(|d| d.current)).width(8))
        .column(ColumnDef::new("ready", "READY", count(|d| d.ready)).width(6))
        .column(ColumnDef::new("updated", "UP-TO-DATE", count(|d| d.updated)).width(10))
        .column(
            ColumnDef::new("status", "STATUS", |d: &DaemonSetItem| d.status().to_string())
                .width(11)
                .sortable(),
        )
        .column(age_column())
        .action(restart_action("daemonset", restart))
        .action(delete_action("daemonset", delete))
        .search(&["name", "status"])
        .status_filter("status", &["Ready", "Progressing", "Idle"])
        .batch(BatchSupport::delete().with_restart());

    (config, ops)
}

pub fn pods(client: &KubeClient) -> (ConsoleConfig<PodItem>, ResourceOps<PodItem>) {
    let delete = namespaced_delete::<Pod>(client);

    let mut ops =
        ResourceOps::new(namespace_lister(client), namespaced_fetch(client, convert::pod));
    ops.delete = Some(delete.clone());

    let config = ConsoleConfig::new(ResourceKind::Pods.title(), ResourceKind::Pods.noun())
        .column(name_column())
        .column(ColumnDef::new("ready", "READY", |p: &PodItem| p.ready_status()).width(6))
        .column(
            ColumnDef::new("status", "STATUS", |p: &PodItem| p.phase.as_str().to_string())
                .width(10)
                .sortable(),
        )
        .column(
            ColumnDef::new("restarts", "RESTARTS", |p: &PodItem| p.restarts.to_string())
                .width(8)
                .sort_by(|p| SortKey::Number(p.restarts.into())),
        )
        .column(
            ColumnDef::new("ip", "IP", |p: &PodItem| {
                p.pod_ip.clone().unwrap_or_else(|| "-".to_string())
            })
            .width(15),
        )
        .column(
            ColumnDef::new("node", "NODE", |p: &PodItem| {
                p.node_name.clone().unwrap_or_else(|| "-".to_string())
            })
            .width(24)
            .sortable(),
        )
        .column(age_column())
        .action(delete_action("pod", delete).force_option())
        .search(&["name", "node", "ip", "status"])
        .status_filter("status", &["Running", "Pending", "Succeeded", "Failed", "Unknown"])
        .batch(BatchSupport::delete())
        .batch_force_option();

    (config, ops)
}

pub fn jobs(client: &KubeClient) -> (ConsoleConfig<JobItem>, ResourceOps<JobItem>) {
    let delete = namespaced_delete::<Job>(client);

    let mut ops =
        ResourceOps::new(namespace_lister(client), namespaced_fetch(client, convert::job));
    ops.delete = Some(delete.clone());

    let config = ConsoleConfig::new(ResourceKind::Jobs.title(), ResourceKind::Jobs.noun())
        .column(name_column())
        .column(
            ColumnDef::new("completions", "COMPLETIONS", |j: &JobItem| j.completion_status())
                .width(11),
        )
        .column(
            ColumnDef::new("failed", "FAILED", |j: &JobItem| j.failed.to_string())
                .width(6)
                .sort_by(|j| SortKey::Number(j.failed.into())),
        )
        .column(
            ColumnDef::new("status", "STATUS", |j: &JobItem| j.status().to_string())
                .width(10)
                .sortable(),
        )
        .column(age_column())
        .action(delete_action("job", delete))
        .search(&["name", "status"])
        .status_filter("status", &["Complete", "Running", "Failed", "Pending"])
        .batch(BatchSupport::delete());

    (config, ops)
}

pub fn hpas(client: &KubeClient) -> (ConsoleConfig<HpaItem>, ResourceOps<HpaItem>) {
    let delete = namespaced_delete::<HorizontalPodAutoscaler>(client);

    let mut ops =
        ResourceOps::new(namespace_lister(client), namespaced_fetch(client, convert::hpa));
    ops.delete = Some(delete.clone());

    let config = ConsoleConfig::new(ResourceKind::Hpas.title(), ResourceKind::Hpas.noun())
        .column(name_column())
        .column(
            ColumnDef::new("target", "REFERENCE", |h: &HpaItem| h.target())
                .width(32)
                .sortable(),
        )
        .column(ColumnDef::new("min", "MINPODS", |h: &HpaItem| h.min_replicas.to_string()).width(7))
        .column(ColumnDef::new("max", "MAXPODS", |h: &HpaItem| h.max_replicas.to_string()).width(7))
        .column(
            ColumnDef::new("replicas", "REPLICAS", |h: &HpaItem| h.current_replicas.to_string())
                .width(8)
                .sort_by(|h| SortKey::Number(h.current_replicas.into())),
        )
        .column(age_column())
        .action(delete_action("hpa", delete))
        .search(&["name", "target"])
        .batch(BatchSupport::delete());

    (config, ops)
}

pub fn roles(client: &KubeClient) -> (ConsoleConfig<RoleItem>, ResourceOps<RoleItem>) {
    let delete = scoped_delete::<Role, ClusterRole>(client);

    let mut ops = ResourceOps::new(
        namespace_lister(client),
        scoped_fetch(client, convert::role, convert::cluster_role),
    );
    ops.delete = Some(delete.clone());

    let config = ConsoleConfig::new(ResourceKind::Roles.title(), ResourceKind::Roles.noun())
        .column(name_column())
        .column(namespace_column())
        .column(
            ColumnDef::new("scope", "SCOPE", |r: &RoleItem| r.scope_label().to_string())
                .width(9)
                .sortable(),
        )
        .column(
            ColumnDef::new("rules", "RULES", |r: &RoleItem| r.rule_count.to_string())
                .width(5)
                .sort_by(|r| SortKey::Number(r.rule_count as i64)),
        )
        .column(age_column())
        .action(delete_action("role", delete).visible_when(|r: &RoleItem| !is_system(r)))
        .search(&["name", "namespace", "scope"])
        .status_filter("scope", &["Cluster", "Namespace"])
        .batch(BatchSupport::delete())
        .namespace_required(false)
        .admin_only();

    (config, ops)
}

pub fn role_bindings(
    client: &KubeClient,
) -> (ConsoleConfig<RoleBindingItem>, ResourceOps<RoleBindingItem>) {
    let delete = scoped_delete::<RoleBinding, ClusterRoleBinding>(client);

    let mut ops = ResourceOps::new(
        namespace_lister(client),
        scoped_fetch(client, convert::role_binding, convert::cluster_role_binding),
    );
    ops.delete = Some(delete.clone());

    let kind = ResourceKind::RoleBindings;
    let config = ConsoleConfig::new(kind.title(), kind.noun())
        .column(name_column())
        .column(namespace_column())
        .column(
            ColumnDef::new("role", "ROLE", |b: &RoleBindingItem| b.role_ref.clone())
                .width(32)
                .sortable(),
        )
        .column(
            ColumnDef::new("subjects", "SUBJECTS", |b: &RoleBindingItem| b.subjects.join(", "))
                .width(36),
        )
        .column(age_column())
        .action(
            delete_action("rolebinding", delete)
                .visible_when(|b: &RoleBindingItem| !is_system(b)),
        )
        .search(&["name", "namespace", "role", "subjects"])
        .batch(BatchSupport::delete())
        .namespace_required(false)
        .admin_only();

    (config, ops)
}

pub fn network_policies(
    client: &KubeClient,
) -> (ConsoleConfig<NetworkPolicyItem>, ResourceOps<NetworkPolicyItem>) {
    let delete = namespaced_delete::<NetworkPolicy>(client);

    let mut ops = ResourceOps::new(
        namespace_lister(client),
        namespaced_fetch(client, convert::network_policy),
    );
    ops.delete = Some(delete.clone());
    ops.label = Some(namespaced_label::<NetworkPolicy>(client));

    let kind = ResourceKind::NetworkPolicies;
    let config = ConsoleConfig::new(kind.title(), kind.noun())
        .column(name_column())
        .column(
            ColumnDef::new("selector", "POD-SELECTOR", |n: &NetworkPolicyItem| {
                n.pod_selector.clone()
            })
            .width(36),
        )
        .column(
            ColumnDef::new("types", "TYPES", |n: &NetworkPolicyItem| n.policy_types.join(","))
                .width(16),
        )
        .column(age_column())
        .action(delete_action("networkpolicy", delete))
        .search(&["name", "selector", "types"])
        .batch(BatchSupport::delete().with_label());

    (config, ops)
}

// ============================================================================
// Shared columns and actions
// ============================================================================

fn name_column<T: ResourceItem>() -> ColumnDef<T> {
    ColumnDef::new("name", "NAME", |item: &T| item.name().to_string()).sortable()
}

fn namespace_column<T: ResourceItem>() -> ColumnDef<T> {
    ColumnDef::new("namespace", "NAMESPACE", |item: &T| match item.namespace() {
        "" => "-".to_string(),
        ns => ns.to_string(),
    })
    .width(18)
    .sortable()
}

/// Sorts youngest first; objects without a timestamp go last
fn age_column<T: ResourceItem>() -> ColumnDef<T> {
    ColumnDef::new("age", "AGE", |item: &T| item.age())
        .width(6)
        .sort_by(|item: &T| {
            SortKey::Number(
                item.meta()
                    .created_at
                    .map(|t| -t.timestamp())
                    .unwrap_or(i64::MAX),
            )
        })
}

fn is_system<T: ResourceItem>(item: &T) -> bool {
    item.name().starts_with("system:")
}

fn delete_action<T: ResourceItem>(noun: &str, delete: DeleteFn) -> ActionDef<T> {
    ActionDef::new("delete", "✗", move |item: T, ctx: ActionContext| {
        delete(OpTarget::of(&item), ctx.delete_mode())
    })
    .hotkey('d')
    .tooltip(format!("Delete {}", noun))
    .danger()
    .labels(FeedbackLabels::new(
        "Deleting {name}",
        "Deleted {name}",
        "Failed to delete {name}",
    ))
    .confirm_text(
        format!("Delete {} {{name}}?", noun),
        format!("The {} {{name}} in {{namespace}} will be permanently deleted.", noun),
    )
}

fn restart_action<T: ResourceItem>(noun: &str, restart: RestartFn) -> ActionDef<T> {
    ActionDef::new("restart", "↻", move |item: T, _ctx: ActionContext| {
        restart(OpTarget::of(&item))
    })
    .hotkey('r')
    .tooltip(format!("Rolling restart of the {}", noun))
    .labels(FeedbackLabels::new(
        "Restarting {name}",
        "Restarted {name}",
        "Failed to restart {name}",
    ))
}

// ============================================================================
// Capability closures
// ============================================================================

fn namespace_lister(
    client: &KubeClient,
) -> impl Fn(ClusterId) -> ApiFuture<Vec<NamespaceInfo>> + Send + Sync + 'static {
    let client = client.clone();
    move |cluster| {
        let client = client.clone();
        async move { client.list_namespaces(cluster).await }.boxed()
    }
}

fn namespaced_fetch<K, T>(
    client: &KubeClient,
    convert: fn(&ClusterInfo, K) -> T,
) -> impl Fn(ClusterId, Option<String>) -> ApiFuture<Vec<T>> + Send + Sync + 'static
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    T: ResourceItem,
{
    let client = client.clone();
    move |cluster, namespace| {
        let client = client.clone();
        async move {
            let info = client.cluster_info(cluster)?;
            let objects = client.list_namespaced::<K>(cluster, namespace.as_deref()).await?;
            Ok(objects.into_iter().map(|o| convert(&info, o)).collect())
        }
        .boxed()
    }
}

/// List a kind that exists in both a namespaced and a cluster-scoped flavour.
/// The cluster-scoped objects are only included when no namespace is chosen.
fn scoped_fetch<N, C, T>(
    client: &KubeClient,
    namespaced: fn(&ClusterInfo, N) -> T,
    cluster_scoped: fn(&ClusterInfo, C) -> T,
) -> impl Fn(ClusterId, Option<String>) -> ApiFuture<Vec<T>> + Send + Sync + 'static
where
    N: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    C: Resource<Scope = ClusterResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    T: ResourceItem,
{
    let client = client.clone();
    move |cluster, namespace| {
        let client = client.clone();
        async move {
            let info = client.cluster_info(cluster)?;
            let mut items = Vec::new();
            if namespace.is_none() {
                let objects = client.list_cluster::<C>(cluster).await?;
                items.extend(objects.into_iter().map(|o| cluster_scoped(&info, o)));
            }
            let objects = client.list_namespaced::<N>(cluster, namespace.as_deref()).await?;
            items.extend(objects.into_iter().map(|o| namespaced(&info, o)));
            Ok(items)
        }
        .boxed()
    }
}

fn namespaced_delete<K>(client: &KubeClient) -> DeleteFn
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let client = client.clone();
    Arc::new(move |target: OpTarget, mode: DeleteMode| {
        let client = client.clone();
        async move { client.delete_namespaced::<K>(&target, mode).await }.boxed()
    })
}

/// Delete through the namespaced kind, or the cluster-scoped one when the
/// target has no namespace
fn scoped_delete<N, C>(client: &KubeClient) -> DeleteFn
where
    N: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    C: Resource<Scope = ClusterResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let client = client.clone();
    Arc::new(move |target: OpTarget, mode: DeleteMode| {
        let client = client.clone();
        async move {
            if target.namespace.is_empty() {
                client.delete_cluster::<C>(&target, mode).await
            } else {
                client.delete_namespaced::<N>(&target, mode).await
            }
        }
        .boxed()
    })
}

fn namespaced_restart<K>(client: &KubeClient) -> RestartFn
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let client = client.clone();
    Arc::new(move |target: OpTarget| {
        let client = client.clone();
        async move { client.restart::<K>(&target).await }.boxed()
    })
}

fn namespaced_label<K>(client: &KubeClient) -> LabelFn
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let client = client.clone();
    Arc::new(move |target: OpTarget, labels: BTreeMap<String, String>| {
        let client = client.clone();
        async move { client.label::<K>(&target, &labels).await }.boxed()
    })
}

/// Restart every item at once; the call fails as a whole if any restart fails
fn concurrent_restart<T: ResourceItem>(
    restart: RestartFn,
) -> impl Fn(Vec<T>) -> ApiFuture<()> + Send + Sync + 'static {
    move |items: Vec<T>| {
        let calls: Vec<_> = items.iter().map(|item| restart(OpTarget::of(item))).collect();
        async move { try_join_all(calls).await.map(|_| ()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kube::config::Kubeconfig;
    use kubedeck_console::{AuditLog, NotificationCenter, Session, UserInfo};
    use kubedeck_types::{ApiError, ItemMeta};

    fn client() -> KubeClient {
        let kubeconfig = Kubeconfig::from_yaml(
            r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev
    cluster:
      server: https://127.0.0.1:6443
contexts:
  - name: dev
    context:
      cluster: dev
users: []
"#,
        )
        .unwrap();
        KubeClient::from_kubeconfig(kubeconfig)
    }

    fn ctx() -> ConsoleContext {
        ConsoleContext {
            session: Session::login(UserInfo::new("alice", vec!["admin".to_string()])),
            notifier: Arc::new(NotificationCenter::default()),
            audit: AuditLog::default(),
        }
    }

    fn cluster() -> ClusterInfo {
        ClusterInfo::new(1, "dev".to_string(), "dev".to_string(), true)
    }

    #[test]
    fn test_every_kind_opens() {
        let client = client();
        for kind in ResourceKind::ALL {
            let view = open_console(kind, &client, ctx());
            assert_eq!(view.title(), kind.title());
            assert_eq!(view.noun(), kind.noun());
            assert!(view.batch_support().delete);

            let rbac = matches!(kind, ResourceKind::Roles | ResourceKind::RoleBindings);
            assert_eq!(view.admin_only(), rbac);
            assert_eq!(view.namespace_required(), !rbac);
        }
    }

    #[test]
    fn test_batch_verbs_per_kind() {
        let client = client();
        let support = |kind| open_console(kind, &client, ctx()).batch_support();

        let deploy = support(ResourceKind::Deployments);
        assert!(deploy.restart && deploy.label);

        let ds = support(ResourceKind::DaemonSets);
        assert!(ds.restart && !ds.label);

        let netpol = support(ResourceKind::NetworkPolicies);
        assert!(!netpol.restart && netpol.label);

        let pods = support(ResourceKind::Pods);
        assert!(!pods.restart && !pods.label);
    }

    #[test]
    fn test_declared_verbs_have_capabilities() {
        let client = client();
        let (config, ops) = deployments(&client);
        assert!(config.batch.delete && ops.delete.is_some());
        assert!(config.batch.restart && ops.restart.is_some() && ops.batch_restart.is_some());
        assert!(config.batch.label && ops.label.is_some());

        let (config, ops) = network_policies(&client);
        assert!(config.batch.label && ops.label.is_some());
        assert!(ops.restart.is_none());
    }

    #[test]
    fn test_restart_disabled_without_replicas() {
        let (config, _) = deployments(&client());
        let restart = config.actions.iter().find(|a| a.key == "restart").unwrap();

        let mut item = DeploymentItem::new(ItemMeta::new(&cluster(), "default", "web"));
        assert!(restart.is_disabled(&item));
        item.replicas = 2;
        assert!(!restart.is_disabled(&item));
    }

    #[test]
    fn test_pod_delete_offers_force() {
        let (config, _) = pods(&client());
        let delete = config.actions.iter().find(|a| a.key == "delete").unwrap();
        assert!(delete.danger);
        assert!(delete.force_option);
        assert!(config.batch_force_option);

        let item = PodItem::new(ItemMeta::new(&cluster(), "default", "web-0"));
        let prompt = delete.prompt_for(&item);
        assert_eq!(prompt.title, "Delete pod web-0?");
        assert!(prompt.description.contains("in default"));
    }

    #[test]
    fn test_system_roles_cannot_be_deleted() {
        let (config, _) = roles(&client());
        let delete = config.actions.iter().find(|a| a.key == "delete").unwrap();

        let system = RoleItem::new(ItemMeta::new(&cluster(), "", "system:controller:job"));
        let custom = RoleItem::new(ItemMeta::new(&cluster(), "", "ci-deployer"));
        assert!(!delete.is_visible(&system));
        assert!(delete.is_visible(&custom));
    }

    #[test]
    fn test_age_sorts_youngest_first() {
        use chrono::{Duration, Utc};

        let column: ColumnDef<JobItem> = age_column();
        let now = Utc::now();
        let job = |name: &str, created| {
            JobItem::new(ItemMeta::new(&cluster(), "default", name).created_at(created))
        };
        let old = job("old", Some(now - Duration::days(3)));
        let young = job("young", Some(now));
        let unknown = JobItem::new(ItemMeta::new(&cluster(), "default", "unknown"));

        assert!(column.compare(&young, &old).is_lt());
        assert!(column.compare(&old, &unknown).is_lt());
    }

    #[tokio::test]
    async fn test_concurrent_restart_fails_as_a_whole() {
        let calls = Arc::new(AtomicUsize::new(0));
        let restart: RestartFn = {
            let calls = Arc::clone(&calls);
            Arc::new(move |target: OpTarget| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if target.name == "b" {
                        Err(ApiError::backend(409, "Conflict", "object was modified"))
                    } else {
                        Ok(())
                    }
                }
                .boxed()
            })
        };

        let bulk = concurrent_restart::<DeploymentItem>(restart);
        let items = ["a", "b", "c"]
            .iter()
            .map(|n| DeploymentItem::new(ItemMeta::new(&cluster(), "default", *n)))
            .collect();

        let err = bulk(items).await.unwrap_err();
        assert_eq!(err, ApiError::backend(409, "Conflict", "object was modified"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

//! Kubernetes client for kubedeck

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Resource;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use kubedeck_console::{DeleteMode, OpTarget};
use kubedeck_types::{ApiError, ClusterId, ClusterInfo, NamespaceInfo};

use crate::convert;

const RESTARTED_AT: &str = "kubectl.kubernetes.io/restartedAt";

/// Kubernetes client wrapper.
///
/// Every kubeconfig context is a cluster; its id is its 1-based position in
/// the kubeconfig. Connections are opened lazily and cached per cluster.
#[derive(Clone)]
pub struct KubeClient {
    inner: Arc<Inner>,
}

struct Inner {
    kubeconfig: Kubeconfig,
    clusters: Vec<ClusterInfo>,
    clients: Mutex<HashMap<ClusterId, kube::Client>>,
}

impl KubeClient {
    /// Create a new KubeClient by loading the kubeconfig
    pub fn new() -> Result<Self> {
        let kubeconfig =
            Kubeconfig::read().context("Failed to read kubeconfig. Is kubectl configured?")?;
        Ok(Self::from_kubeconfig(kubeconfig))
    }

    pub fn from_kubeconfig(kubeconfig: Kubeconfig) -> Self {
        let clusters = clusters_of(&kubeconfig);
        debug!(count = clusters.len(), "loaded kubeconfig contexts");
        Self {
            inner: Arc::new(Inner {
                kubeconfig,
                clusters,
                clients: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn clusters(&self) -> &[ClusterInfo] {
        &self.inner.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterInfo> {
        self.inner.clusters.iter().find(|c| c.id == id)
    }

    /// The cluster of the kubeconfig's current context
    pub fn current_cluster(&self) -> Option<ClusterId> {
        self.inner.clusters.iter().find(|c| c.is_current).map(|c| c.id)
    }

    /// Look a cluster up by context or cluster name
    pub fn find_cluster(&self, name: &str) -> Option<ClusterId> {
        self.inner
            .clusters
            .iter()
            .find(|c| c.context == name)
            .or_else(|| self.inner.clusters.iter().find(|c| c.name == name))
            .map(|c| c.id)
    }

    pub(crate) fn cluster_info(&self, id: ClusterId) -> Result<ClusterInfo, ApiError> {
        self.cluster(id).cloned().ok_or(ApiError::UnknownCluster(id))
    }

    /// The connection for a cluster, opened on first use
    pub async fn client(&self, id: ClusterId) -> Result<kube::Client, ApiError> {
        let cached = self.inner.clients.lock().get(&id).cloned();
        if let Some(client) = cached {
            return Ok(client);
        }

        let info = self.cluster_info(id)?;
        let client = self
            .client_for_context(&info.context)
            .await
            .map_err(|e| ApiError::Transport(format!("{:#}", e)))?;

        self.inner.clients.lock().insert(id, client.clone());
        Ok(client)
    }

    /// Create a kube::Client for a specific context
    async fn client_for_context(&self, context_name: &str) -> Result<kube::Client> {
        let config = kube::Config::from_custom_kubeconfig(
            self.inner.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(context_name.to_string()),
                ..Default::default()
            },
        )
        .await
        .context(format!(
            "Failed to create config for context: {}",
            context_name
        ))?;

        let client = kube::Client::try_from(config).context(format!(
            "Failed to create client for context: {}",
            context_name
        ))?;

        info!(context = %context_name, "connected to cluster");
        Ok(client)
    }

    /// Get all namespaces of a cluster
    pub async fn list_namespaces(&self, id: ClusterId) -> Result<Vec<NamespaceInfo>, ApiError> {
        let client = self.client(id).await?;
        let api: Api<Namespace> = Api::all(client);
        let list = api.list(&ListParams::default()).await.map_err(api_error)?;

        Ok(convert::namespaces(list.items))
    }

    /// List a namespaced kind in one namespace, or across all of them
    pub async fn list_namespaced<K>(
        &self,
        id: ClusterId,
        namespace: Option<&str>,
    ) -> Result<Vec<K>, ApiError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let client = self.client(id).await?;
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        };
        let list = api.list(&ListParams::default()).await.map_err(api_error)?;
        Ok(list.items)
    }

    pub async fn list_cluster<K>(&self, id: ClusterId) -> Result<Vec<K>, ApiError>
    where
        K: Resource<Scope = ClusterResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let client = self.client(id).await?;
        let api: Api<K> = Api::all(client);
        let list = api.list(&ListParams::default()).await.map_err(api_error)?;
        Ok(list.items)
    }

    pub async fn delete_namespaced<K>(
        &self,
        target: &OpTarget,
        mode: DeleteMode,
    ) -> Result<(), ApiError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let client = self.client(target.cluster_id).await?;
        let api: Api<K> = Api::namespaced(client, &target.namespace);
        api.delete(&target.name, &delete_params(mode))
            .await
            .map_err(api_error)?;

        info!(
            kind = %K::kind(&()),
            namespace = %target.namespace,
            name = %target.name,
            ?mode,
            "deleted"
        );
        Ok(())
    }

    pub async fn delete_cluster<K>(
        &self,
        target: &OpTarget,
        mode: DeleteMode,
    ) -> Result<(), ApiError>
    where
        K: Resource<Scope = ClusterResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let client = self.client(target.cluster_id).await?;
        let api: Api<K> = Api::all(client);
        api.delete(&target.name, &delete_params(mode))
            .await
            .map_err(api_error)?;

        info!(kind = %K::kind(&()), name = %target.name, ?mode, "deleted");
        Ok(())
    }

    /// Trigger a rolling restart the way `kubectl rollout restart` does
    pub async fn restart<K>(&self, target: &OpTarget) -> Result<(), ApiError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let patch = restart_patch(&Utc::now().to_rfc3339());
        self.merge_patch::<K>(target, &patch).await?;

        info!(
            kind = %K::kind(&()),
            namespace = %target.namespace,
            name = %target.name,
            "restarted"
        );
        Ok(())
    }

    /// Merge the given labels into the object's labels
    pub async fn label<K>(
        &self,
        target: &OpTarget,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let patch = json!({ "metadata": { "labels": labels } });
        self.merge_patch::<K>(target, &patch).await?;

        info!(
            kind = %K::kind(&()),
            namespace = %target.namespace,
            name = %target.name,
            count = labels.len(),
            "labeled"
        );
        Ok(())
    }

    async fn merge_patch<K>(
        &self,
        target: &OpTarget,
        patch: &serde_json::Value,
    ) -> Result<(), ApiError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let client = self.client(target.cluster_id).await?;
        let api: Api<K> = Api::namespaced(client, &target.namespace);
        api.patch(&target.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(api_error)?;
        Ok(())
    }
}

fn clusters_of(kubeconfig: &Kubeconfig) -> Vec<ClusterInfo> {
    let current = kubeconfig.current_context.as_deref();
    kubeconfig
        .contexts
        .iter()
        .enumerate()
        .map(|(idx, named)| {
            let context = named.context.as_ref();
            let cluster_name = context
                .map(|c| c.cluster.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| named.name.clone());

            let mut info = ClusterInfo::new(
                idx as ClusterId + 1,
                cluster_name,
                named.name.clone(),
                current == Some(named.name.as_str()),
            );
            info.namespace = context.and_then(|c| c.namespace.clone());
            info.server = kubeconfig
                .clusters
                .iter()
                .find(|c| c.name == info.name)
                .and_then(|c| c.cluster.as_ref())
                .and_then(|c| c.server.clone());
            info
        })
        .collect()
}

fn delete_params(mode: DeleteMode) -> DeleteParams {
    match mode {
        DeleteMode::Graceful => DeleteParams::background(),
        DeleteMode::Immediate => DeleteParams::background().grace_period(0),
    }
}

fn restart_patch(at: &str) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": { RESTARTED_AT: at }
                }
            }
        }
    })
}

/// Map a client error onto the console's error type
pub fn api_error(err: kube::Error) -> ApiError {
    match err {
        kube::Error::Api(resp) => ApiError::backend(resp.code, resp.reason, resp.message),
        other => ApiError::Transport(other.to_string()),
    }
}

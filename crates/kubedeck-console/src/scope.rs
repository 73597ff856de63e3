//! Cluster/namespace scope of a console instance

use kubedeck_types::{ClusterId, NamespaceInfo};

/// Snapshot of the current scope
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    pub cluster_id: Option<ClusterId>,
    pub namespace: Option<String>,
}

/// Bumped on every scope change; results captured under an older value are stale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Bumped on every cluster change; guards namespace enumeration results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClusterEpoch(u64);

/// What applying a namespace list did to the scope
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespacesApplied {
    /// Result belonged to a previous cluster and was dropped
    Stale,
    /// List stored, namespace selection unchanged
    Stored,
    /// List stored and the namespace selection changed
    Reselected,
}

#[derive(Debug)]
pub struct ScopeState {
    cluster_id: Option<ClusterId>,
    namespace: Option<String>,
    namespaces: Vec<NamespaceInfo>,
    namespaces_loaded: bool,
    namespace_required: bool,
    generation: Generation,
    epoch: ClusterEpoch,
}

impl ScopeState {
    pub fn new(namespace_required: bool) -> Self {
        Self {
            cluster_id: None,
            namespace: None,
            namespaces: Vec::new(),
            namespaces_loaded: false,
            namespace_required,
            generation: Generation::default(),
            epoch: ClusterEpoch::default(),
        }
    }

    pub fn scope(&self) -> Scope {
        Scope {
            cluster_id: self.cluster_id,
            namespace: self.namespace.clone(),
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        self.cluster_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn namespaces(&self) -> &[NamespaceInfo] {
        &self.namespaces
    }

    pub fn namespaces_loaded(&self) -> bool {
        self.namespaces_loaded
    }

    pub fn namespace_required(&self) -> bool {
        self.namespace_required
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn epoch(&self) -> ClusterEpoch {
        self.epoch
    }

    /// A fetch may run once the cluster (and namespace, if required) is known
    pub fn is_settled(&self) -> bool {
        self.cluster_id.is_some() && (!self.namespace_required || self.namespace.is_some())
    }

    /// Switch clusters. Returns the new epoch when the cluster actually changed.
    ///
    /// The namespace selection survives so a preselected namespace can be kept
    /// if the new cluster has it.
    pub fn set_cluster(&mut self, cluster_id: ClusterId) -> Option<ClusterEpoch> {
        if self.cluster_id == Some(cluster_id) {
            return None;
        }
        self.cluster_id = Some(cluster_id);
        self.namespaces.clear();
        self.namespaces_loaded = false;
        self.epoch.0 += 1;
        self.bump();
        Some(self.epoch)
    }

    /// Select a namespace (or all namespaces with `None`). Returns true on change.
    pub fn set_namespace(&mut self, namespace: Option<String>) -> bool {
        if self.namespace == namespace {
            return false;
        }
        self.namespace = namespace;
        self.bump();
        true
    }

    /// Store an enumerated namespace list captured under `epoch`.
    ///
    /// When a namespace is required and none is selected, or the selected one
    /// does not exist on this cluster, the first entry in API order is chosen.
    /// Otherwise a namespace missing from this cluster falls back to all
    /// namespaces.
    pub fn apply_namespaces(
        &mut self,
        epoch: ClusterEpoch,
        namespaces: Vec<NamespaceInfo>,
    ) -> NamespacesApplied {
        if epoch != self.epoch {
            return NamespacesApplied::Stale;
        }
        self.namespaces = namespaces;
        self.namespaces_loaded = true;

        let keep = self
            .namespace
            .as_deref()
            .is_some_and(|current| self.namespaces.iter().any(|ns| ns.name == current));
        if keep {
            return NamespacesApplied::Stored;
        }

        if !self.namespace_required {
            return if self.set_namespace(None) {
                NamespacesApplied::Reselected
            } else {
                NamespacesApplied::Stored
            };
        }

        let first = self.namespaces.first().map(|ns| ns.name.clone());
        if self.set_namespace(first) {
            NamespacesApplied::Reselected
        } else {
            NamespacesApplied::Stored
        }
    }

    fn bump(&mut self) {
        self.generation.0 += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(names: &[&str]) -> Vec<NamespaceInfo> {
        names.iter().map(|n| NamespaceInfo::new(*n, "Active")).collect()
    }

    #[test]
    fn test_not_settled_until_namespace_chosen() {
        let mut scope = ScopeState::new(true);
        assert!(!scope.is_settled());

        let epoch = scope.set_cluster(5).unwrap();
        assert!(!scope.is_settled());

        let applied = scope.apply_namespaces(epoch, ns(&["kube-system", "default"]));
        assert_eq!(applied, NamespacesApplied::Reselected);
        // API order, not sorted
        assert_eq!(scope.namespace(), Some("kube-system"));
        assert!(scope.is_settled());
    }

    #[test]
    fn test_cluster_only_scope_settles_immediately() {
        let mut scope = ScopeState::new(false);
        let epoch = scope.set_cluster(1).unwrap();
        assert!(scope.is_settled());

        assert_eq!(
            scope.apply_namespaces(epoch, ns(&["default"])),
            NamespacesApplied::Stored
        );
        assert_eq!(scope.namespace(), None);
    }

    #[test]
    fn test_preselected_namespace_is_kept_when_present() {
        let mut scope = ScopeState::new(true);
        scope.set_namespace(Some("default".to_string()));
        let epoch = scope.set_cluster(2).unwrap();

        let applied = scope.apply_namespaces(epoch, ns(&["alpha", "default"]));
        assert_eq!(applied, NamespacesApplied::Stored);
        assert_eq!(scope.namespace(), Some("default"));
    }

    #[test]
    fn test_missing_namespace_falls_back_to_first() {
        let mut scope = ScopeState::new(true);
        scope.set_namespace(Some("gone".to_string()));
        let epoch = scope.set_cluster(2).unwrap();

        scope.apply_namespaces(epoch, ns(&["alpha", "beta"]));
        assert_eq!(scope.namespace(), Some("alpha"));
    }

    #[test]
    fn test_optional_namespace_missing_on_new_cluster_falls_back_to_all() {
        let mut scope = ScopeState::new(false);
        let epoch = scope.set_cluster(1).unwrap();
        scope.apply_namespaces(epoch, ns(&["team-a"]));
        scope.set_namespace(Some("team-a".to_string()));

        let epoch = scope.set_cluster(2).unwrap();
        let before = scope.generation();
        assert_eq!(
            scope.apply_namespaces(epoch, ns(&["other"])),
            NamespacesApplied::Reselected
        );
        assert_eq!(scope.namespace(), None);
        assert!(scope.generation() > before);
    }

    #[test]
    fn test_optional_namespace_present_on_new_cluster_is_kept() {
        let mut scope = ScopeState::new(false);
        scope.set_namespace(Some("team-a".to_string()));
        let epoch = scope.set_cluster(2).unwrap();

        assert_eq!(
            scope.apply_namespaces(epoch, ns(&["other", "team-a"])),
            NamespacesApplied::Stored
        );
        assert_eq!(scope.namespace(), Some("team-a"));
    }

    #[test]
    fn test_empty_namespace_list() {
        let mut scope = ScopeState::new(true);
        let epoch = scope.set_cluster(2).unwrap();
        assert_eq!(scope.apply_namespaces(epoch, Vec::new()), NamespacesApplied::Stored);
        assert!(scope.namespaces_loaded());
        assert!(!scope.is_settled());
    }

    #[test]
    fn test_stale_namespace_list_is_dropped() {
        let mut scope = ScopeState::new(true);
        let first = scope.set_cluster(1).unwrap();
        scope.set_cluster(2).unwrap();

        assert_eq!(scope.apply_namespaces(first, ns(&["a"])), NamespacesApplied::Stale);
        assert!(scope.namespaces().is_empty());
        assert_eq!(scope.namespace(), None);
    }

    #[test]
    fn test_namespace_change_does_not_invalidate_enumeration() {
        let mut scope = ScopeState::new(true);
        let epoch = scope.set_cluster(1).unwrap();
        scope.set_namespace(Some("b".to_string()));

        assert_eq!(scope.apply_namespaces(epoch, ns(&["a", "b"])), NamespacesApplied::Stored);
        assert_eq!(scope.namespace(), Some("b"));
    }

    #[test]
    fn test_generation_bumps_on_every_change() {
        let mut scope = ScopeState::new(true);
        let g0 = scope.generation();
        scope.set_cluster(1);
        let g1 = scope.generation();
        assert!(g1 > g0);

        assert!(scope.set_cluster(1).is_none());
        assert_eq!(scope.generation(), g1);

        scope.set_namespace(Some("x".to_string()));
        assert!(scope.generation() > g1);
    }
}

//! Active cluster resolution

use kubedeck_types::ClusterId;

/// Where the resolved cluster came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterSource {
    /// An explicit override (command line, deep link)
    Explicit,
    /// The ambient selection
    Active,
    /// Nothing selected yet; the UI asks the user to pick a cluster
    Unset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterContext {
    pub cluster_id: Option<ClusterId>,
    pub source: ClusterSource,
}

impl ClusterContext {
    pub fn is_unset(&self) -> bool {
        self.source == ClusterSource::Unset
    }
}

/// Resolve the single active cluster.
///
/// An explicit value wins when it parses as a positive integer; anything else
/// in that slot is ignored. Falls back to the active cluster, then to unset.
pub fn resolve_cluster(explicit: Option<&str>, active: Option<ClusterId>) -> ClusterContext {
    if let Some(id) = explicit.and_then(parse_cluster_id) {
        return ClusterContext {
            cluster_id: Some(id),
            source: ClusterSource::Explicit,
        };
    }

    match active {
        Some(id) => ClusterContext {
            cluster_id: Some(id),
            source: ClusterSource::Active,
        },
        None => ClusterContext {
            cluster_id: None,
            source: ClusterSource::Unset,
        },
    }
}

fn parse_cluster_id(raw: &str) -> Option<ClusterId> {
    raw.parse::<ClusterId>().ok().filter(|id| *id > 0)
}

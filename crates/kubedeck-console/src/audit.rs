use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use kubedeck_types::ClusterId;

/// Result of a recorded destructive operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditOutcome {
    Succeeded,
    /// Aborted after `completed` of `total` items
    Partial {
        completed: usize,
        total: usize,
        error: String,
    },
    Failed(String),
}

impl AuditOutcome {
    pub fn label(&self) -> String {
        match self {
            Self::Succeeded => "ok".to_string(),
            Self::Partial {
                completed, total, ..
            } => format!("partial {}/{}", completed, total),
            Self::Failed(_) => "failed".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub user: String,
    pub cluster_id: Option<ClusterId>,
    pub namespace: Option<String>,
    pub resource: String,
    pub verb: String,
    pub targets: Vec<String>,
    pub outcome: AuditOutcome,
}

/// Thread-safe ring buffer of audit entries
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl AuditLog {
    /// Create a new audit log with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity,
        }
    }

    /// Push a new entry, evicting oldest if at capacity
    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Get all entries, oldest first
    pub fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cluster: ClusterId, verb: &str) -> AuditEntry {
        AuditEntry {
            at: Utc::now(),
            user: "alice".to_string(),
            cluster_id: Some(cluster),
            namespace: Some("default".to_string()),
            resource: "deployment".to_string(),
            verb: verb.to_string(),
            targets: vec!["web".to_string()],
            outcome: AuditOutcome::Succeeded,
        }
    }

    #[test]
    fn test_bounded() {
        let log = AuditLog::new(2);
        log.record(entry(1, "delete"));
        log.record(entry(1, "restart"));
        log.record(entry(2, "label"));
        let verbs: Vec<_> = log.all().into_iter().map(|e| e.verb).collect();
        assert_eq!(verbs, ["restart", "label"]);
    }

    #[test]
    fn test_outcome_label() {
        let partial = AuditOutcome::Partial {
            completed: 1,
            total: 3,
            error: "boom".to_string(),
        };
        assert_eq!(partial.label(), "partial 1/3");
    }
}

//! Pending / success / failure notifications around async actions

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use kubedeck_types::UserMessage;

static NEXT_NOTIFICATION: AtomicU64 = AtomicU64::new(1);

/// Identity of one notification lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn next() -> Self {
        Self(NEXT_NOTIFICATION.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub id: NotificationId,
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(id: NotificationId, level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// A standalone error notice with its own lifecycle
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationId::next(), NoticeLevel::Error, message)
    }
}

/// Toast-like presentation of notices. Publishing a notice whose id is already
/// shown replaces it.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// Messages for the three phases of an action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackLabels {
    pub loading: String,
    pub success: String,
    pub error: String,
}

impl FeedbackLabels {
    pub fn new(
        loading: impl Into<String>,
        success: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            loading: loading.into(),
            success: success.into(),
            error: error.into(),
        }
    }

    /// Substitute `{name}` in every label
    pub fn render(&self, name: &str) -> Self {
        Self {
            loading: self.loading.replace("{name}", name),
            success: self.success.replace("{name}", name),
            error: self.error.replace("{name}", name),
        }
    }
}

/// Run `action`, publishing a pending notice first and replacing it with a
/// success or error notice once it settles. The error is handed back to the
/// caller unchanged.
pub async fn run_with_feedback<F, T, E>(
    sink: &dyn NotificationSink,
    labels: FeedbackLabels,
    action: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: UserMessage,
{
    let id = NotificationId::next();
    sink.publish(Notice::new(id, NoticeLevel::Pending, labels.loading));

    match action.await {
        Ok(value) => {
            sink.publish(Notice::new(id, NoticeLevel::Success, labels.success));
            Ok(value)
        }
        Err(err) => {
            let detail = err.user_message();
            let message = if detail.is_empty() {
                labels.error
            } else {
                format!("{}: {}", labels.error, detail)
            };
            sink.publish(Notice::new(id, NoticeLevel::Error, message));
            Err(err)
        }
    }
}

/// Bounded in-memory notice list, newest last
#[derive(Clone)]
pub struct NotificationCenter {
    notices: Arc<RwLock<VecDeque<Notice>>>,
    capacity: usize,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        Self {
            notices: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Notices worth showing at `now`: every pending one, plus settled ones younger than `ttl`
    pub fn visible(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<Notice> {
        self.notices
            .read()
            .iter()
            .filter(|n| n.level == NoticeLevel::Pending || now - n.at < ttl)
            .cloned()
            .collect()
    }

    /// Drop settled notices older than `ttl`
    pub fn prune(&self, now: DateTime<Utc>, ttl: Duration) {
        self.notices
            .write()
            .retain(|n| n.level == NoticeLevel::Pending || now - n.at < ttl);
    }

    /// Dismiss the newest settled notice
    pub fn dismiss_latest(&self) -> bool {
        let mut notices = self.notices.write();
        match notices.iter().rposition(|n| n.level != NoticeLevel::Pending) {
            Some(idx) => {
                notices.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.notices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.read().is_empty()
    }
}

impl NotificationSink for NotificationCenter {
    fn publish(&self, notice: Notice) {
        let mut notices = self.notices.write();
        if let Some(existing) = notices.iter_mut().find(|n| n.id == notice.id) {
            *existing = notice;
            return;
        }
        if notices.len() >= self.capacity {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use kubedeck_types::ApiError;

    fn labels() -> FeedbackLabels {
        FeedbackLabels::new("Deleting web", "Deleted web", "Failed to delete web")
    }

    #[tokio::test]
    async fn test_success_replaces_pending() {
        let sink = RecordingSink::default();
        let result: Result<u32, ApiError> =
            run_with_feedback(&sink, labels(), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Pending);
        assert_eq!(notices[0].message, "Deleting web");
        assert_eq!(notices[1].level, NoticeLevel::Success);
        assert_eq!(notices[1].id, notices[0].id);
    }

    #[tokio::test]
    async fn test_error_is_reported_once_and_rethrown() {
        let sink = RecordingSink::default();
        let err = ApiError::Rejected("x".to_string());
        let result: Result<(), ApiError> =
            run_with_feedback(&sink, labels(), async { Err(ApiError::Rejected("x".to_string())) })
                .await;
        assert_eq!(result, Err(err));

        let notices = sink.notices();
        let errors: Vec<_> = notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Failed to delete web: x");
        assert_eq!(errors[0].id, notices[0].id);
    }

    #[tokio::test]
    async fn test_concurrent_calls_get_independent_lifecycles() {
        let sink = RecordingSink::default();
        let (a, b) = futures::join!(
            run_with_feedback(&sink, labels(), async { Ok::<_, ApiError>(()) }),
            run_with_feedback(&sink, labels(), async { Ok::<_, ApiError>(()) }),
        );
        assert!(a.is_ok() && b.is_ok());

        let notices = sink.notices();
        let pending: Vec<_> = notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Pending)
            .map(|n| n.id)
            .collect();
        assert_eq!(pending.len(), 2);
        assert_ne!(pending[0], pending[1]);
    }

    #[test]
    fn test_render_labels() {
        let labels = FeedbackLabels::new("Deleting {name}", "Deleted {name}", "Failed: {name}");
        let rendered = labels.render("api");
        assert_eq!(rendered.loading, "Deleting api");
        assert_eq!(rendered.error, "Failed: api");
    }

    #[test]
    fn test_center_replaces_by_id_and_expires() {
        let center = NotificationCenter::new(4);
        let id = NotificationId::next();
        center.publish(Notice::new(id, NoticeLevel::Pending, "working"));
        center.publish(Notice::new(id, NoticeLevel::Success, "done"));
        assert_eq!(center.len(), 1);

        let later = Utc::now() + Duration::seconds(10);
        assert!(center.visible(later, Duration::seconds(4)).is_empty());
        assert_eq!(center.visible(Utc::now(), Duration::seconds(4)).len(), 1);

        center.prune(later, Duration::seconds(4));
        assert!(center.is_empty());
    }

    #[test]
    fn test_center_keeps_pending_and_is_bounded() {
        let center = NotificationCenter::new(2);
        center.publish(Notice::new(NotificationId::next(), NoticeLevel::Pending, "a"));
        center.publish(Notice::error("b"));
        center.publish(Notice::error("c"));
        assert_eq!(center.len(), 2);

        let later = Utc::now() + Duration::seconds(60);
        center.prune(later, Duration::seconds(4));
        assert!(center.is_empty());

        center.publish(Notice::new(NotificationId::next(), NoticeLevel::Pending, "d"));
        center.prune(later, Duration::seconds(4));
        assert_eq!(center.len(), 1);
        assert!(!center.dismiss_latest());
    }
}

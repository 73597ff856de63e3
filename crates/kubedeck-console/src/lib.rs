//! Generic resource-console engine
//!
//! A [`ResourceConsole`] owns everything a list view of one resource type needs
//! apart from the network: cluster/namespace scope, fetch tracking, search and
//! status filtering, selection, per-row actions, batch verbs, the confirmation
//! dialog and notifications. Resource types plug in through [`ConsoleConfig`]
//! and the [`ResourceOps`] capability record.

pub mod actions;
pub mod audit;
pub mod batch;
pub mod config;
pub mod confirm;
pub mod console;
pub mod context;
pub mod error;
pub mod feedback;
pub mod fetch;
pub mod filter;
pub mod ops;
pub mod scope;
pub mod selection;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use actions::{ActionContext, ActionDef, ActionVariant, Dispatch, RowControl};
pub use audit::{AuditEntry, AuditLog, AuditOutcome};
pub use batch::{BatchFailure, BatchReport, BatchSupport, BatchVerb, parse_label_spec};
pub use config::{ColumnDef, ConsoleConfig, SortKey, StatusFilterSpec};
pub use confirm::{ConfirmPhase, ConfirmVariant, Prompt};
pub use console::{
    ConsoleContext, ConsoleEvent, ConsoleStatus, ConsoleTask, PendingEffect, ResourceConsole,
};
pub use context::{ClusterContext, ClusterSource, resolve_cluster};
pub use error::{ConsoleError, ConsoleResult};
pub use feedback::{
    FeedbackLabels, Notice, NoticeLevel, NotificationCenter, NotificationSink, run_with_feedback,
};
pub use filter::{StatusFilter, filter_items};
pub use ops::{DeleteMode, OpTarget, ResourceOps};
pub use scope::Scope;
pub use session::{Access, AccessPolicy, RoleRequirement, Session, UserInfo, gate};
pub use view::{ColumnView, ConsoleView, DynEvent, DynTask, RowView};

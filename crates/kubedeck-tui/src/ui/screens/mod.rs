//! Screen implementations

mod audit_log;
mod cluster_select;
mod namespace_picker;
mod resource_list;

pub use audit_log::AuditLogScreen;
pub use cluster_select::ClusterSelectScreen;
pub use namespace_picker::NamespacePicker;
pub use resource_list::ResourceListScreen;

//! Static per-resource-type configuration of a console

use std::cmp::Ordering;
use std::sync::Arc;

use kubedeck_types::ResourceItem;

use crate::actions::ActionDef;
use crate::batch::BatchSupport;

pub type RenderFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
pub type SortKeyFn<T> = Arc<dyn Fn(&T) -> SortKey + Send + Sync>;

/// Comparable value a column sorts by
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Number(i64),
    Text(String),
}

/// One table column
pub struct ColumnDef<T> {
    pub key: &'static str,
    pub header: &'static str,
    /// Preferred width in cells; 0 lets the column fill remaining space
    pub width: u16,
    pub render: RenderFn<T>,
    pub sortable: bool,
    pub sort_key: Option<SortKeyFn<T>>,
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            header: self.header,
            width: self.width,
            render: Arc::clone(&self.render),
            sortable: self.sortable,
            sort_key: self.sort_key.clone(),
        }
    }
}

impl<T: ResourceItem> ColumnDef<T> {
    pub fn new<F>(key: &'static str, header: &'static str, render: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            key,
            header,
            width: 0,
            render: Arc::new(render),
            sortable: false,
            sort_key: None,
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// Sort by the rendered text
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Sort by a dedicated key instead of the rendered text
    pub fn sort_by<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> SortKey + Send + Sync + 'static,
    {
        self.sortable = true;
        self.sort_key = Some(Arc::new(key));
        self
    }

    pub fn render(&self, item: &T) -> String {
        (self.render)(item)
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match &self.sort_key {
            Some(key) => key(a).cmp(&key(b)),
            None => self.render(a).cmp(&self.render(b)),
        }
    }
}

/// Status selector options over one item field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusFilterSpec {
    pub field: &'static str,
    pub options: Vec<String>,
}

/// Everything a console needs to know about one resource type
pub struct ConsoleConfig<T> {
    pub title: String,
    /// Singular lowercase name, e.g. "deployment"
    pub noun: String,
    pub columns: Vec<ColumnDef<T>>,
    pub actions: Vec<ActionDef<T>>,
    pub search_fields: Vec<&'static str>,
    pub status_filter: Option<StatusFilterSpec>,
    pub batch: BatchSupport,
    /// Show the force checkbox when confirming a batch delete
    pub batch_force_option: bool,
    pub namespace_required: bool,
    pub admin_only: bool,
}

impl<T> Clone for ConsoleConfig<T> {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            noun: self.noun.clone(),
            columns: self.columns.clone(),
            actions: self.actions.clone(),
            search_fields: self.search_fields.clone(),
            status_filter: self.status_filter.clone(),
            batch: self.batch,
            batch_force_option: self.batch_force_option,
            namespace_required: self.namespace_required,
            admin_only: self.admin_only,
        }
    }
}

impl<T: ResourceItem> ConsoleConfig<T> {
    pub fn new(title: impl Into<String>, noun: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            noun: noun.into(),
            columns: Vec::new(),
            actions: Vec::new(),
            search_fields: vec!["name"],
            status_filter: None,
            batch: BatchSupport::none(),
            batch_force_option: false,
            namespace_required: true,
            admin_only: false,
        }
    }

    pub fn column(mut self, column: ColumnDef<T>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn action(mut self, action: ActionDef<T>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn search(mut self, fields: &[&'static str]) -> Self {
        self.search_fields = fields.to_vec();
        self
    }

    pub fn status_filter(mut self, field: &'static str, options: &[&str]) -> Self {
        self.status_filter = Some(StatusFilterSpec {
            field,
            options: options.iter().map(|o| o.to_string()).collect(),
        });
        self
    }

    pub fn batch(mut self, support: BatchSupport) -> Self {
        self.batch = support;
        self
    }

    pub fn batch_force_option(mut self) -> Self {
        self.batch_force_option = true;
        self
    }

    pub fn namespace_required(mut self, required: bool) -> Self {
        self.namespace_required = required;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    /// "1 deployment", "3 deployments"
    pub fn count_label(&self, count: usize) -> String {
        if count == 1 {
            format!("1 {}", self.noun)
        } else {
            format!("{} {}", count, self.title.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestItem, item};

    #[test]
    fn test_column_compare() {
        let by_name =
            ColumnDef::new("name", "NAME", |i: &TestItem| i.name().to_string()).sortable();
        let by_replicas =
            ColumnDef::new("replicas", "REPLICAS", |i: &TestItem| i.replicas.to_string())
                .sort_by(|i: &TestItem| SortKey::Number(i.replicas.into()));

        let mut nine = item("a");
        nine.replicas = 9;
        let mut ten = item("b");
        ten.replicas = 10;

        assert_eq!(by_name.compare(&nine, &ten), Ordering::Less);
        // Numeric, not lexicographic
        assert_eq!(by_replicas.compare(&nine, &ten), Ordering::Less);
        assert_eq!(by_replicas.render(&ten), "10");
    }

    #[test]
    fn test_count_label() {
        let config: ConsoleConfig<TestItem> =
            ConsoleConfig::new("NetworkPolicies", "networkpolicy");
        assert_eq!(config.count_label(1), "1 networkpolicy");
        assert_eq!(config.count_label(3), "3 networkpolicies");
    }
}

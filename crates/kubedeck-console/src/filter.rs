use kubedeck_types::ResourceItem;

/// Status selector state; `All` matches everything
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    /// Parse a selector value; empty or "all" (any case) means no filtering
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(value) => value,
        }
    }

    /// Step through `options`, wrapping back to `All` after the last one
    pub fn cycle(&self, options: &[String]) -> Self {
        let next = match self {
            Self::All => options.first(),
            Self::Only(current) => options
                .iter()
                .position(|o| o.eq_ignore_ascii_case(current))
                .and_then(|i| options.get(i + 1)),
        };
        next.map(|o| Self::Only(o.clone())).unwrap_or(Self::All)
    }
}

/// Item predicate combining free-text search and status equality
#[derive(Clone)]
pub struct Filter<'a> {
    /// Lowercased search term (empty = all)
    needle: String,

    /// Fields searched by the term
    fields: &'a [&'a str],

    /// Field compared against the status selector
    status_field: Option<&'a str>,

    /// Lowercased status value to match (None = all)
    status: Option<String>,
}

impl<'a> Filter<'a> {
    pub fn new(search: &str, fields: &'a [&'a str]) -> Self {
        Self {
            needle: search.to_lowercase(),
            fields,
            status_field: None,
            status: None,
        }
    }

    /// Add a status predicate on `field`
    pub fn with_status(mut self, field: &'a str, status: &StatusFilter) -> Self {
        self.status_field = Some(field);
        self.status = match status {
            StatusFilter::All => None,
            StatusFilter::Only(value) if value.eq_ignore_ascii_case("all") => None,
            StatusFilter::Only(value) => Some(value.to_lowercase()),
        };
        self
    }

    /// Check if an item passes both predicates
    pub fn matches<T: ResourceItem>(&self, item: &T) -> bool {
        self.matches_search(item) && self.matches_status(item)
    }

    fn matches_search<T: ResourceItem>(&self, item: &T) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        self.fields.iter().any(|field| {
            item.field(field)
                .and_then(|value| value.as_text().map(|text| text.to_lowercase()))
                .is_some_and(|text| text.contains(&self.needle))
        })
    }

    fn matches_status<T: ResourceItem>(&self, item: &T) -> bool {
        let (Some(field), Some(wanted)) = (self.status_field, self.status.as_deref()) else {
            return true;
        };
        item.field(field)
            .and_then(|value| value.as_text().map(|text| text.to_lowercase()))
            .is_some_and(|text| text == wanted)
    }

    /// Keep the matching items, in their original order
    pub fn apply<'i, T: ResourceItem>(&self, items: &'i [T]) -> Vec<&'i T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

impl std::fmt::Debug for Filter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("needle", &self.needle)
            .field("fields", &self.fields)
            .field("status_field", &self.status_field)
            .field("status", &self.status)
            .finish()
    }
}

/// Filter a list by search term over `fields` and an optional `(field, selector)` status predicate
pub fn filter_items<T: ResourceItem>(
    items: &[T],
    search: &str,
    fields: &[&str],
    status: Option<(&str, &StatusFilter)>,
) -> Vec<T> {
    let mut filter = Filter::new(search, fields);
    if let Some((field, selector)) = status {
        filter = filter.with_status(field, selector);
    }
    filter.apply(items).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::item;

    const FIELDS: &[&str] = &["name", "namespace", "owner"];

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let items = vec![item("Web-Frontend"), item("api"), item("worker")];
        let found = filter_items(&items, "FRONT", FIELDS, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Web-Frontend");
    }

    #[test]
    fn test_empty_search_returns_everything_in_order() {
        let items = vec![item("c"), item("a"), item("b")];
        let found = filter_items(&items, "", FIELDS, None);
        let names: Vec<_> = found.iter().map(|i| i.name()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_non_text_fields_never_match() {
        let mut numeric = item("alpha");
        numeric.replicas = 42;
        let items = vec![numeric];
        // "replicas" is a number field; "42" must not match through it
        assert!(filter_items(&items, "42", &["replicas"], None).is_empty());
    }

    #[test]
    fn test_missing_fields_never_match() {
        let items = vec![item("alpha")];
        assert!(filter_items(&items, "alpha", &["nonexistent"], None).is_empty());
    }

    #[test]
    fn test_any_field_matches() {
        let mut owned = item("alpha");
        owned.owner = Some("team-payments".to_string());
        let items = vec![owned, item("beta")];
        let found = filter_items(&items, "payments", FIELDS, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "alpha");
    }

    #[test]
    fn test_status_equality_and_and() {
        let items = vec![
            item("web").with_status("Running"),
            item("web-canary").with_status("Pending"),
            item("db").with_status("running"),
        ];

        let running = StatusFilter::Only("RUNNING".to_string());
        let found = filter_items(&items, "", FIELDS, Some(("status", &running)));
        let names: Vec<_> = found.iter().map(|i| i.name()).collect();
        assert_eq!(names, ["web", "db"]);

        let found = filter_items(&items, "web", FIELDS, Some(("status", &running)));
        let names: Vec<_> = found.iter().map(|i| i.name()).collect();
        assert_eq!(names, ["web"]);

        // Equality, not substring
        let partial = StatusFilter::Only("Run".to_string());
        assert!(filter_items(&items, "", FIELDS, Some(("status", &partial))).is_empty());
    }

    #[test]
    fn test_status_all_matches_everything() {
        let items = vec![item("a").with_status("Running"), item("b")];
        let all = StatusFilter::parse("all");
        assert_eq!(all, StatusFilter::All);
        assert_eq!(filter_items(&items, "", FIELDS, Some(("status", &all))).len(), 2);

        let all = StatusFilter::Only("ALL".to_string());
        assert_eq!(filter_items(&items, "", FIELDS, Some(("status", &all))).len(), 2);
    }

    #[test]
    fn test_idempotent_subset() {
        let items = vec![item("web"), item("api"), item("web-2"), item("cache")];
        let once = filter_items(&items, "web", FIELDS, None);
        let twice = filter_items(&once, "web", FIELDS, None);
        let a: Vec<_> = once.iter().map(|i| i.name()).collect();
        let b: Vec<_> = twice.iter().map(|i| i.name()).collect();
        assert_eq!(a, b);
        assert!(once.len() <= items.len());
    }

    #[test]
    fn test_status_cycle() {
        let options = vec!["Running".to_string(), "Failed".to_string()];
        let s = StatusFilter::All.cycle(&options);
        assert_eq!(s, StatusFilter::Only("Running".to_string()));
        let s = s.cycle(&options);
        assert_eq!(s, StatusFilter::Only("Failed".to_string()));
        assert_eq!(s.cycle(&options), StatusFilter::All);
    }
}

//! Fetch tracking and row identity derivation

use std::collections::HashSet;

use tracing::warn;

use kubedeck_types::{ItemId, ResourceItem};

use crate::scope::Generation;

/// An item paired with its derived identity
#[derive(Clone, Debug)]
pub struct Row<T> {
    pub id: ItemId,
    pub item: T,
}

/// Identifies one fetch request and the scope generation it was issued under
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub request: u64,
}

/// Tracks the single fetch a console cares about
#[derive(Debug, Default)]
pub struct FetchTracker {
    next_request: u64,
    in_flight: Option<FetchTicket>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, superseding whatever was in flight
    pub fn begin(&mut self, generation: Generation) -> FetchTicket {
        self.next_request += 1;
        let ticket = FetchTicket {
            generation,
            request: self.next_request,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Whether a completed fetch should be applied. Clears the in-flight slot on a match.
    pub fn accept(&mut self, ticket: FetchTicket, current: Generation) -> bool {
        if self.in_flight != Some(ticket) || ticket.generation != current {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Forget the tracked fetch; its result will be discarded
    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Pair every item with its identity. Later duplicates of an identity are dropped.
pub fn derive_rows<T: ResourceItem>(items: Vec<T>) -> Vec<Row<T>> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let id = item.id();
        if !seen.insert(id.clone()) {
            warn!(id = %id, "duplicate item identity in fetch result, keeping the first");
            continue;
        }
        rows.push(Row { id, item });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::items;

    #[test]
    fn test_newer_fetch_supersedes() {
        let mut tracker = FetchTracker::new();
        let generation = Generation::default();
        let first = tracker.begin(generation);
        let second = tracker.begin(generation);

        assert!(!tracker.accept(first, generation));
        assert!(tracker.is_loading());
        assert!(tracker.accept(second, generation));
        assert!(!tracker.is_loading());
        // Applied once only
        assert!(!tracker.accept(second, generation));
    }

    #[test]
    fn test_cancelled_fetch_is_discarded() {
        let mut tracker = FetchTracker::new();
        let ticket = tracker.begin(Generation::default());
        tracker.cancel();
        assert!(!tracker.accept(ticket, Generation::default()));
    }

    #[test]
    fn test_derive_rows_dedupes() {
        let rows = derive_rows(items(&["a", "b", "a"]));
        let names: Vec<_> = rows.iter().map(|r| r.item.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(rows[0].id.as_str(), "5/default/a");
    }
}

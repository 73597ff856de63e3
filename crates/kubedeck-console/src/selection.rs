use std::collections::HashSet;

use kubedeck_types::ItemId;

/// Set of checked row identities
#[derive(Clone, Debug, Default)]
pub struct Selection {
    ids: HashSet<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Replace the selection with exactly the given (visible) ids
    pub fn select_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        self.ids = visible.into_iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop every id not in `visible`; returns how many were dropped
    pub fn retain_visible<'a, I>(&mut self, visible: I) -> usize
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let visible: HashSet<&ItemId> = visible.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id));
        before - self.ids.len()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// True when every visible id is selected (and there is at least one)
    pub fn covers<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let mut any = false;
        for id in visible {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|n| ItemId::derive(5, "default", n)).collect()
    }

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        let a = ItemId::derive(1, "ns", "a");
        assert!(selection.toggle(&a));
        assert!(selection.contains(&a));
        assert!(!selection.toggle(&a));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_is_exactly_visible() {
        let all = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.toggle(&all[0]);

        let visible = &all[1..2];
        selection.select_all(visible);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&all[1]));
        assert!(!selection.contains(&all[0]));
    }

    #[test]
    fn test_retain_visible_drops_hidden() {
        let all = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.select_all(&all);

        let dropped = selection.retain_visible(&all[..1]);
        assert_eq!(dropped, 2);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&all[0]));
    }

    #[test]
    fn test_covers() {
        let all = ids(&["a", "b"]);
        let mut selection = Selection::new();
        assert!(!selection.covers(&all));
        assert!(!selection.covers(&[]));
        selection.select_all(&all);
        assert!(selection.covers(&all));
    }
}

use crate::filter::{Filter, FilterKey, FilterKind};

/// The live filter list shared by the editing and search surfaces.
///
/// Owned by whoever orchestrates the flow and lent to both sides, so every
/// mutation is visible to the next reader. `revision` changes on every
/// mutation and lets callers notice a superseded query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilterSet {
    filters: Vec<Filter>,
    revision: u64,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut set = Self::new();
        set.replace_all(filters);
        set
    }

    /// Replace the entry with the same `(kind, identity)` in place, or append
    pub fn upsert(&mut self, filter: Filter) {
        self.insert_without_bump(filter);
        self.bump();
    }

    /// Remove the matching entry. Returns whether anything was removed.
    pub fn remove(&mut self, filter: &Filter) -> bool {
        self.remove_key(filter.key())
    }

    pub fn remove_key(&mut self, key: FilterKey) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.key() != key);

        let removed = self.filters.len() != before;
        if removed {
            self.bump();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.bump();
    }

    /// Clear and load `filters` in order, keeping the set's invariants
    pub fn replace_all(&mut self, filters: impl IntoIterator<Item = Filter>) {
        self.filters.clear();
        for filter in filters {
            self.insert_without_bump(filter);
        }
        self.bump();
    }

    pub fn snapshot(&self) -> Vec<Filter> {
        self.filters.clone()
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.filters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// First filter of `kind`; the only one for date and member count ranges
    pub fn get(&self, kind: FilterKind) -> Option<&Filter> {
        self.filters.iter().find(|f| f.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn insert_without_bump(&mut self, filter: Filter) {
        // Value kinds have no identity, so their key is the kind alone
        let key = filter.key();
        match self.filters.iter_mut().find(|f| f.key() == key) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

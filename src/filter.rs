// 🔎 Filter Controller - Current category selection
//
// Owns the selected CategoryFilter (ALL by default), builds the chip items
// for the TypeSelector section and the filtered rows for the EntryList
// section. Filtering is a stable sub-selection of the master list, never a
// re-sort, and matches labels exactly.

use crate::entry::{CategoryFilter, Entry, EntryStore};
use crate::snapshot::Item;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FilterController {
    selected: CategoryFilter,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &CategoryFilter {
        &self.selected
    }

    /// ALL chip first, then one chip per derived label in first-seen order.
    ///
    /// Every call mints fresh identities.
    pub fn build_chip_items(&self, store: &EntryStore) -> Vec<Item> {
        std::iter::once(CategoryFilter::All)
            .chain(
                store
                    .categories()
                    .iter()
                    .cloned()
                    .map(CategoryFilter::Label),
            )
            .map(Item::chip)
            .collect()
    }

    /// Change the selection; returns false (and changes nothing) when the
    /// label is not in the store's current label set.
    pub fn select_category(&mut self, store: &EntryStore, filter: &CategoryFilter) -> bool {
        let valid = match filter {
            CategoryFilter::All => true,
            CategoryFilter::Label(label) => store.contains_category(label),
        };

        if !valid {
            debug!(category = %filter, "ignoring selection of unknown category");
            return false;
        }

        self.selected = filter.clone();
        true
    }

    /// Fall back to ALL if the selected label vanished after a reload.
    /// Returns true if the selection changed.
    pub fn clamp(&mut self, store: &EntryStore) -> bool {
        if let CategoryFilter::Label(label) = &self.selected {
            if !store.contains_category(label) {
                debug!(category = %label, "selected category no longer present, resetting to all");
                self.selected = CategoryFilter::All;
                return true;
            }
        }
        false
    }

    pub fn reset(&mut self) {
        self.selected = CategoryFilter::All;
    }

    /// Exact-match predicate for the current selection
    pub fn matches(&self, entry: &Entry) -> bool {
        match &self.selected {
            CategoryFilter::All => true,
            CategoryFilter::Label(label) => entry.has_category(label),
        }
    }

    /// Entries matching the selection, in master-list (rank) order
    pub fn filtered_entries<'a>(&self, store: &'a EntryStore) -> Vec<&'a Entry> {
        store
            .entries()
            .iter()
            .filter(|entry| self.matches(entry))
            .collect()
    }

    /// The matching subset of already-minted row items.
    ///
    /// Rows keep their identities, so re-filtering diffs to a handful of
    /// inserts/removes instead of a full reload.
    pub fn filter_rows(&self, rows: &[Item]) -> Vec<Item> {
        rows.iter()
            .filter(|item| item.as_entry().is_some_and(|entry| self.matches(entry)))
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

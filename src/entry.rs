// 📚 Entry Store - Sorted master list + derived category labels
//
// An Entry is an immutable external record. Its identity is its rank
// (pokedex order): two entries with the same rank are the same entity,
// whatever their other fields say.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// CATEGORY LABEL
// ============================================================================

/// String-valued category name ("fire", "water", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    pub fn new(label: impl Into<String>) -> Self {
        CategoryLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryLabel {
    fn from(label: &str) -> Self {
        CategoryLabel::new(label)
    }
}

// ============================================================================
// CATEGORY FILTER (chip payload)
// ============================================================================

/// A filter value: the ALL sentinel or one concrete label.
///
/// Chips carry this as their payload; the filter controller holds one as
/// its current selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Label(CategoryLabel),
}

impl CategoryFilter {
    pub fn label(label: impl Into<String>) -> Self {
        CategoryFilter::Label(CategoryLabel::new(label))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }

    /// Text shown on the chip
    pub fn display_name(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Label(label) => label.as_str(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Pokedex order - the entry's identity
    pub rank: u32,

    /// Display name
    pub name: String,

    /// Thumbnail reference (image URL), resolved by the image collaborator
    pub thumbnail: String,

    /// Ordered set of category labels (no duplicates, upstream order kept)
    pub categories: Vec<CategoryLabel>,
}

impl Entry {
    pub fn new(
        rank: u32,
        name: impl Into<String>,
        thumbnail: impl Into<String>,
        categories: impl IntoIterator<Item = CategoryLabel>,
    ) -> Self {
        let mut seen = HashSet::new();
        let categories = categories
            .into_iter()
            .filter(|label| seen.insert(label.clone()))
            .collect();

        Entry {
            rank,
            name: name.into(),
            thumbnail: thumbnail.into(),
            categories,
        }
    }

    /// Exact label match
    pub fn has_category(&self, label: &CategoryLabel) -> bool {
        self.categories.iter().any(|c| c == label)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
    }
}

// ============================================================================
// ENTRY STORE
// ============================================================================

/// Full master list, sorted by rank, plus the labels derived from it.
///
/// Empty input is a valid state: empty list, empty label set.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
    categories: Vec<CategoryLabel>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the master list, sort it by rank and re-derive the labels
    pub fn load(&mut self, mut entries: Vec<Entry>) {
        // Stable sort keeps upstream order for equal ranks
        entries.sort_by_key(|entry| entry.rank);

        let mut seen = HashSet::new();
        let mut categories = Vec::new();
        for entry in &entries {
            for label in &entry.categories {
                if seen.insert(label.clone()) {
                    categories.push(label.clone());
                }
            }
        }

        self.entries = entries;
        self.categories = categories;
    }

    /// Master list in ascending rank order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Derived labels in first-seen order
    pub fn categories(&self) -> &[CategoryLabel] {
        &self.categories
    }

    pub fn contains_category(&self, label: &CategoryLabel) -> bool {
        self.categories.iter().any(|c| c == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry(rank: u32, name: &str, cats: &[&str]) -> Entry {
        Entry::new(
            rank,
            name,
            format!("https://img.example/{}.png", rank),
            cats.iter().map(|c| CategoryLabel::from(*c)),
        )
    }

    #[test]
    fn test_load_sorts_by_rank() {
        let mut store = EntryStore::new();
        store.load(vec![
            create_test_entry(4, "charmander", &["fire"]),
            create_test_entry(1, "bulbasaur", &["grass", "poison"]),
            create_test_entry(7, "squirtle", &["water"]),
        ]);

        let ranks: Vec<u32> = store.entries().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 4, 7]);
    }

    #[test]
    fn test_categories_first_seen_order_and_unique() {
        let mut store = EntryStore::new();
        store.load(vec![
            create_test_entry(2, "ivysaur", &["grass", "poison"]),
            create_test_entry(1, "bulbasaur", &["grass", "poison"]),
            create_test_entry(6, "charizard", &["fire", "flying"]),
            create_test_entry(4, "charmander", &["fire"]),
        ]);

        let labels: Vec<&str> = store.categories().iter().map(|c| c.as_str()).collect();
        assert_eq!(labels, vec!["grass", "poison", "fire", "flying"]);
    }

    #[test]
    fn test_load_replaces_previous_state() {
        let mut store = EntryStore::new();
        store.load(vec![create_test_entry(1, "bulbasaur", &["grass"])]);
        store.load(vec![create_test_entry(7, "squirtle", &["water"])]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].name, "squirtle");
        assert!(!store.contains_category(&"grass".into()));
        assert!(store.contains_category(&"water".into()));
    }

    #[test]
    fn test_empty_load_is_valid() {
        let mut store = EntryStore::new();
        store.load(vec![create_test_entry(1, "bulbasaur", &["grass"])]);
        store.load(Vec::new());

        assert!(store.is_empty());
        assert!(store.categories().is_empty());
    }

    #[test]
    fn test_entry_identity_is_rank() {
        let a = create_test_entry(25, "pikachu", &["electric"]);
        let b = create_test_entry(25, "pikachu-alt", &["normal"]);
        let c = create_test_entry(26, "pikachu", &["electric"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_entry_categories_deduplicated() {
        let entry = create_test_entry(1, "bulbasaur", &["grass", "grass", "poison"]);
        assert_eq!(entry.categories.len(), 2);
        assert!(entry.has_category(&"poison".into()));
        assert!(!entry.has_category(&"pois".into()));
    }
}

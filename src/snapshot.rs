// 📸 Snapshot Model - What should be on screen
//
// A snapshot is an ordered mapping Section -> ordered item identities, with a
// lookup from identity to the full Item. Built append-only, then frozen.
//
// "Item payload is a VALUE, ItemId is IDENTITY": two chips with the same
// label are still different items, because identity is assigned when the
// Item is constructed, never derived from its content.

use crate::entry::{CategoryFilter, Entry};
use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// SECTION
// ============================================================================

/// The two fixed sections, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    TypeSelector,
    EntryList,
}

impl Section {
    /// Every section, in display order. Never changes at runtime.
    pub const ALL: [Section; 2] = [Section::TypeSelector, Section::EntryList];

    pub fn index(self) -> usize {
        match self {
            Section::TypeSelector => 0,
            Section::EntryList => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::TypeSelector => "TypeSelector",
            Section::EntryList => "EntryList",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ITEM
// ============================================================================

/// Stable, globally unique identity token of an Item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    fn fresh() -> Self {
        ItemId(Uuid::new_v4())
    }

    #[cfg(test)]
    pub(crate) fn from_u128(raw: u128) -> Self {
        ItemId(Uuid::from_u128(raw))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(ItemId)
    }
}

/// Payload of an Item - dispatched on by the renderer, never by the diff
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ItemKind {
    TypeChip { filter: CategoryFilter },
    EntryRow { entry: Entry },
}

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    id: ItemId,
    #[serde(flatten)]
    kind: ItemKind,
}

impl Item {
    pub fn chip(filter: CategoryFilter) -> Self {
        Item {
            id: ItemId::fresh(),
            kind: ItemKind::TypeChip { filter },
        }
    }

    pub fn row(entry: Entry) -> Self {
        Item {
            id: ItemId::fresh(),
            kind: ItemKind::EntryRow { entry },
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn as_chip(&self) -> Option<&CategoryFilter> {
        match &self.kind {
            ItemKind::TypeChip { filter } => Some(filter),
            ItemKind::EntryRow { .. } => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match &self.kind {
            ItemKind::EntryRow { entry } => Some(entry),
            ItemKind::TypeChip { .. } => None,
        }
    }
}

/// Items compare by identity only
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Frozen description of the desired UI collection.
///
/// Invariants:
/// - both sections are present (possibly empty)
/// - an identity appears at most once across the whole snapshot
///
/// There is no `&mut` API. A new state is a new Snapshot; items are shared
/// between versions through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    version: u64,
    sections: [Vec<ItemId>; 2],
    items: HashMap<ItemId, Arc<Item>>,
}

impl Snapshot {
    /// Both sections present and empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ordered identities of one section
    pub fn item_ids(&self, section: Section) -> &[ItemId] {
        &self.sections[section.index()]
    }

    /// Ordered items of one section
    pub fn items(&self, section: Section) -> impl Iterator<Item = &Item> + '_ {
        self.item_ids(section)
            .iter()
            .filter_map(move |id| self.items.get(id).map(|item| item.as_ref()))
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id).map(|item| item.as_ref())
    }

    pub fn item_at(&self, section: Section, index: usize) -> Option<&Item> {
        self.item_ids(section)
            .get(index)
            .and_then(|id| self.item(*id))
    }

    pub fn index_of(&self, section: Section, id: ItemId) -> Option<usize> {
        self.item_ids(section).iter().position(|candidate| *candidate == id)
    }

    pub fn section_of(&self, id: ItemId) -> Option<Section> {
        Section::ALL
            .into_iter()
            .find(|section| self.item_ids(*section).contains(&id))
    }

    pub fn len(&self, section: Section) -> usize {
        self.item_ids(section).len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|ids| ids.is_empty())
    }

    /// New snapshot (version + 1) with one section's contents replaced.
    ///
    /// The other section is carried over untouched; `self` is not modified.
    pub fn replacing_section(
        &self,
        section: Section,
        items: Vec<Item>,
    ) -> Result<Snapshot, SnapshotError> {
        let mut builder = SnapshotBuilder {
            version: self.version + 1,
            ..SnapshotBuilder::default()
        };

        let mut replacement = Some(items);
        for other in Section::ALL {
            if other == section {
                if let Some(items) = replacement.take() {
                    builder.append_items(section, items)?;
                }
            } else {
                for id in self.item_ids(other) {
                    if let Some(item) = self.items.get(id) {
                        builder.append_shared(other, Arc::clone(item))?;
                    }
                }
            }
        }

        Ok(builder.build())
    }
}

// ============================================================================
// SNAPSHOT BUILDER
// ============================================================================

/// Append-only construction; `build` freezes the result.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: u64,
    sections: [Vec<ItemId>; 2],
    items: HashMap<ItemId, Arc<Item>>,
}

impl SnapshotBuilder {
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Append items to the end of a section.
    ///
    /// Fails on the first identity already present anywhere in the snapshot.
    pub fn append_items(
        &mut self,
        section: Section,
        items: impl IntoIterator<Item = Item>,
    ) -> Result<&mut Self, SnapshotError> {
        for item in items {
            self.append_shared(section, Arc::new(item))?;
        }
        Ok(self)
    }

    fn append_shared(&mut self, section: Section, item: Arc<Item>) -> Result<(), SnapshotError> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(SnapshotError::DuplicateIdentity { id, section });
        }
        self.items.insert(id, item);
        self.sections[section.index()].push(id);
        Ok(())
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            version: self.version,
            sections: self.sections,
            items: self.items,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CategoryLabel;

    fn create_test_entry(rank: u32, name: &str) -> Entry {
        Entry::new(rank, name, "", [CategoryLabel::from("normal")])
    }

    #[test]
    fn test_empty_snapshot_has_both_sections() {
        let snapshot = Snapshot::empty();
        for section in Section::ALL {
            assert_eq!(snapshot.len(section), 0);
        }
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_same_payload_distinct_identity() {
        let a = Item::chip(CategoryFilter::label("fire"));
        let b = Item::chip(CategoryFilter::label("fire"));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);

        let mut builder = Snapshot::builder();
        builder
            .append_items(Section::TypeSelector, vec![a, b])
            .unwrap();
        assert_eq!(builder.build().len(Section::TypeSelector), 2);
    }

    #[test]
    fn test_duplicate_identity_within_section_rejected() {
        let chip = Item::chip(CategoryFilter::All);
        let mut builder = Snapshot::builder();
        let err = builder
            .append_items(Section::TypeSelector, vec![chip.clone(), chip.clone()])
            .unwrap_err();

        assert_eq!(
            err,
            SnapshotError::DuplicateIdentity {
                id: chip.id(),
                section: Section::TypeSelector
            }
        );
    }

    #[test]
    fn test_duplicate_identity_across_sections_rejected() {
        let row = Item::row(create_test_entry(1, "bulbasaur"));
        let mut builder = Snapshot::builder();
        builder.append_items(Section::EntryList, vec![row.clone()]).unwrap();

        let err = builder
            .append_items(Section::TypeSelector, vec![row])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateIdentity { section: Section::TypeSelector, .. }));
    }

    #[test]
    fn test_lookup_by_index_and_identity() {
        let rows = vec![
            Item::row(create_test_entry(1, "bulbasaur")),
            Item::row(create_test_entry(4, "charmander")),
        ];
        let second = rows[1].id();

        let mut builder = Snapshot::builder();
        builder.append_items(Section::EntryList, rows).unwrap();
        let snapshot = builder.build();

        assert_eq!(snapshot.index_of(Section::EntryList, second), Some(1));
        assert_eq!(snapshot.section_of(second), Some(Section::EntryList));
        let entry = snapshot.item_at(Section::EntryList, 1).and_then(Item::as_entry);
        assert_eq!(entry.map(|e| e.name.as_str()), Some("charmander"));
        assert!(snapshot.item_at(Section::EntryList, 2).is_none());
    }

    #[test]
    fn test_replacing_section_leaves_original_untouched() {
        let chips = vec![Item::chip(CategoryFilter::All)];
        let chip_id = chips[0].id();
        let mut builder = Snapshot::builder();
        builder.append_items(Section::TypeSelector, chips).unwrap();
        builder
            .append_items(Section::EntryList, vec![Item::row(create_test_entry(1, "bulbasaur"))])
            .unwrap();
        let first = builder.build();

        let second = first
            .replacing_section(Section::EntryList, Vec::new())
            .unwrap();

        assert_eq!(first.len(Section::EntryList), 1);
        assert_eq!(second.len(Section::EntryList), 0);
        assert_eq!(second.item_ids(Section::TypeSelector), &[chip_id]);
        assert_eq!(second.version(), first.version() + 1);
    }

    #[test]
    fn test_replacing_section_rejects_identity_from_other_section() {
        let chip = Item::chip(CategoryFilter::All);
        let mut builder = Snapshot::builder();
        builder.append_items(Section::TypeSelector, vec![chip.clone()]).unwrap();
        let snapshot = builder.build();

        let err = snapshot
            .replacing_section(Section::EntryList, vec![chip])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateIdentity { .. }));
    }
}

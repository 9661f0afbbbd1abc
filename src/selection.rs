// 🎯 Selection State - Which chip is highlighted
//
// Two states:
//   Default               no user interaction yet; highlight follows
//                         default_selection (the ALL chip)
//   UserSelected(id)      sticky after a tap, until the chip set is rebuilt
//                         with different content

use crate::entry::CategoryFilter;
use crate::snapshot::{Item, ItemId, Section};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Default,
    UserSelected(ItemId),
}

/// Identity of the ALL chip, else the first item, else none.
///
/// Only the TypeSelector section has a highlighted item.
pub fn default_selection(section: Section, items: &[Item]) -> Option<ItemId> {
    if section != Section::TypeSelector {
        return None;
    }

    items
        .iter()
        .find(|item| item.as_chip().is_some_and(CategoryFilter::is_all))
        .or_else(|| items.first())
        .map(Item::id)
}

#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    state: SelectionState,
    highlighted: Option<ItemId>,
    chip_ids: Vec<ItemId>,
    chip_labels: Vec<CategoryFilter>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn highlighted(&self) -> Option<ItemId> {
        self.highlighted
    }

    /// Whether committing `items` would drop a user selection
    pub fn would_reset(&self, items: &[Item]) -> bool {
        matches!(self.state, SelectionState::UserSelected(_))
            && !items
                .iter()
                .filter_map(Item::as_chip)
                .eq(self.chip_labels.iter())
    }

    /// Re-assert the highlight after a TypeSelector commit.
    ///
    /// Returns true if a user selection was dropped because the chip
    /// content changed.
    pub fn on_chips_committed(&mut self, items: &[Item]) -> bool {
        let labels: Vec<CategoryFilter> = items
            .iter()
            .filter_map(|item| item.as_chip().cloned())
            .collect();
        let content_changed = labels != self.chip_labels;

        let mut dropped = false;
        if let SelectionState::UserSelected(id) = self.state {
            if content_changed {
                debug!(chip = %id, "chip set changed, selection back to default");
                self.state = SelectionState::Default;
                dropped = true;
            } else {
                // Same content, fresh identities: follow the chip by position
                let carried = self
                    .chip_ids
                    .iter()
                    .position(|old| *old == id)
                    .and_then(|pos| items.get(pos))
                    .map(Item::id);
                self.state = match carried {
                    Some(id) => SelectionState::UserSelected(id),
                    None => SelectionState::Default,
                };
            }
        }

        self.chip_ids = items.iter().map(Item::id).collect();
        self.chip_labels = labels;
        self.highlighted = match self.state {
            SelectionState::Default => default_selection(Section::TypeSelector, items),
            SelectionState::UserSelected(id) => Some(id),
        };
        dropped
    }

    /// A tap on a chip of the committed set. Unknown identities are ignored.
    pub fn on_user_tap(&mut self, id: ItemId) -> bool {
        if !self.chip_ids.contains(&id) {
            return false;
        }
        debug!(chip = %id, "user selected chip");
        self.state = SelectionState::UserSelected(id);
        self.highlighted = Some(id);
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{CategoryLabel, Entry};

    fn chips(labels: &[&str]) -> Vec<Item> {
        std::iter::once(Item::chip(CategoryFilter::All))
            .chain(labels.iter().map(|l| Item::chip(CategoryFilter::label(*l))))
            .collect()
    }

    #[test]
    fn test_default_selection_is_all_chip() {
        let items = chips(&["fire", "water"]);
        assert_eq!(
            default_selection(Section::TypeSelector, &items),
            Some(items[0].id())
        );
    }

    #[test]
    fn test_default_selection_falls_back_to_first() {
        let items = vec![
            Item::chip(CategoryFilter::label("fire")),
            Item::chip(CategoryFilter::label("water")),
        ];
        assert_eq!(
            default_selection(Section::TypeSelector, &items),
            Some(items[0].id())
        );
        assert_eq!(default_selection(Section::TypeSelector, &[]), None);
    }

    #[test]
    fn test_default_selection_ignores_entry_list() {
        let rows = vec![Item::row(Entry::new(1, "bulbasaur", "", [CategoryLabel::from("grass")]))];
        assert_eq!(default_selection(Section::EntryList, &rows), None);
    }

    #[test]
    fn test_tap_is_sticky_across_identical_rebuild() {
        let mut tracker = SelectionTracker::new();
        let first = chips(&["fire", "water"]);
        tracker.on_chips_committed(&first);
        assert!(tracker.on_user_tap(first[2].id()));

        let rebuilt = chips(&["fire", "water"]);
        assert!(!tracker.on_chips_committed(&rebuilt));
        assert_eq!(tracker.state(), SelectionState::UserSelected(rebuilt[2].id()));
        assert_eq!(tracker.highlighted(), Some(rebuilt[2].id()));
    }

    #[test]
    fn test_content_change_resets_to_default() {
        let mut tracker = SelectionTracker::new();
        let first = chips(&["fire", "water"]);
        tracker.on_chips_committed(&first);
        tracker.on_user_tap(first[1].id());

        let rebuilt = chips(&["fire", "grass"]);
        assert!(tracker.would_reset(&rebuilt));
        assert!(!tracker.would_reset(&chips(&["fire", "water"])));
        assert!(tracker.on_chips_committed(&rebuilt));
        assert_eq!(tracker.state(), SelectionState::Default);
        assert_eq!(tracker.highlighted(), Some(rebuilt[0].id()));
    }

    #[test]
    fn test_tap_on_unknown_chip_ignored() {
        let mut tracker = SelectionTracker::new();
        let first = chips(&["fire"]);
        tracker.on_chips_committed(&first);

        let stranger = Item::chip(CategoryFilter::label("fire"));
        assert!(!tracker.on_user_tap(stranger.id()));
        assert_eq!(tracker.state(), SelectionState::Default);
        assert_eq!(tracker.highlighted(), Some(first[0].id()));
    }
}

// 🧩 Board - The single apply context
//
// Owns the entry store, the filter controller, the selection tracker and the
// last committed snapshot. Every state change goes through `&mut self`, so
// snapshot construction and diffing are serialized by ownership: wrap the
// board in a mutex or drive it from one loop, never both.
//
// Flow:
//   fetch completes  -> rebuild both sections -> diff -> one commit
//   chip tapped      -> rebuild EntryList only -> diff -> one commit

use crate::entry::{CategoryFilter, Entry, EntryStore};
use crate::error::{ApplyError, NetworkFailure, SnapshotError};
use crate::filter::FilterController;
use crate::reconciliation::{apply_script, diff, EditScript};
use crate::selection::{SelectionState, SelectionTracker};
use crate::snapshot::{Item, ItemId, Section, Snapshot};
use crate::source::FetchOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Oldest commit records are dropped past this many
pub const HISTORY_LIMIT: usize = 64;

// ============================================================================
// COMMIT
// ============================================================================

/// Result of one state change: the new snapshot version and one edit
/// script per section that was rebuilt, in section order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub version: u64,
    pub scripts: Vec<EditScript>,
}

impl Commit {
    pub fn script(&self, section: Section) -> Option<&EditScript> {
        self.scripts.iter().find(|script| script.section == section)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub version: u64,
    pub section: Section,
    pub inserts: usize,
    pub removes: usize,
    pub moves: usize,
    pub committed_at: DateTime<Utc>,
}

// ============================================================================
// RENDERER
// ============================================================================

/// The rendering collaborator. Applies each script, in order, and animates
/// however it likes. `snapshot` is the newly committed state, for payload
/// lookups of inserted identities.
pub trait Renderer {
    fn commit(
        &mut self,
        section: Section,
        script: &EditScript,
        snapshot: &Snapshot,
    ) -> Result<(), ApplyError>;
}

/// Reference renderer: keeps the rendered identity list of each section
#[derive(Debug, Clone, Default)]
pub struct RenderedList {
    sections: [Vec<ItemId>; 2],
}

impl RenderedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self, section: Section) -> &[ItemId] {
        &self.sections[section.index()]
    }
}

impl Renderer for RenderedList {
    fn commit(
        &mut self,
        section: Section,
        script: &EditScript,
        _snapshot: &Snapshot,
    ) -> Result<(), ApplyError> {
        apply_script(&mut self.sections[section.index()], script)
    }
}

// ============================================================================
// BOARD
// ============================================================================

#[derive(Debug, Default)]
pub struct Board {
    store: EntryStore,
    filter: FilterController,
    selection: SelectionTracker,
    /// One row item per master-list entry; minted once per fetch
    rows: Vec<Item>,
    committed: Snapshot,
    history: VecDeque<CommitRecord>,
    last_error: Option<NetworkFailure>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion of an entry fetch.
    ///
    /// A failure changes nothing but `last_error`; the last good snapshot
    /// stays committed.
    pub fn on_fetch_complete(&mut self, outcome: FetchOutcome) -> Result<Option<Commit>, SnapshotError> {
        let entries = match outcome {
            Ok(entries) => entries,
            Err(failure) => {
                warn!(reason = %failure.reason, "entry fetch failed, keeping current snapshot");
                self.last_error = Some(failure);
                return Ok(None);
            }
        };
        self.last_error = None;

        self.store.load(entries);
        info!(
            entries = self.store.len(),
            categories = self.store.categories().len(),
            "entry store loaded"
        );

        let chips = self.filter.build_chip_items(&self.store);
        if self.selection.would_reset(&chips) {
            self.filter.reset();
        }
        self.filter.clamp(&self.store);

        self.rows = self.store.entries().iter().cloned().map(Item::row).collect();
        let visible = self.filter.filter_rows(&self.rows);

        let mut builder = Snapshot::builder().version(self.committed.version() + 1);
        builder.append_items(Section::TypeSelector, chips)?;
        builder.append_items(Section::EntryList, visible)?;

        let commit = self.commit(builder.build(), &Section::ALL)?;

        let committed_chips: Vec<Item> = self
            .committed
            .items(Section::TypeSelector)
            .cloned()
            .collect();
        self.selection.on_chips_committed(&committed_chips);

        Ok(Some(commit))
    }

    /// A tap on any committed item.
    ///
    /// Rows produce no commit (they open a detail view elsewhere). Chips
    /// change the filter and rebuild EntryList only; a chip whose label is
    /// not in the current label set is clamped to a no-op.
    pub fn on_chip_tapped(&mut self, id: ItemId) -> Result<Option<Commit>, SnapshotError> {
        let item = self
            .committed
            .item(id)
            .ok_or(SnapshotError::UnknownItem(id))?;
        let Some(filter) = item.as_chip().cloned() else {
            debug!(item = %id, "tap on entry row, no filter change");
            return Ok(None);
        };

        if !self.filter.select_category(&self.store, &filter) {
            return Ok(None);
        }
        self.selection.on_user_tap(id);
        debug!(category = %filter, "category selected");

        let visible = self.filter.filter_rows(&self.rows);
        let next = self.committed.replacing_section(Section::EntryList, visible)?;
        self.commit(next, &[Section::EntryList]).map(Some)
    }

    /// Select by filter value instead of chip identity
    pub fn select_category(&mut self, filter: &CategoryFilter) -> Result<Option<Commit>, SnapshotError> {
        let chip = self
            .committed
            .items(Section::TypeSelector)
            .find(|item| item.as_chip() == Some(filter))
            .map(Item::id);

        match chip {
            Some(id) => self.on_chip_tapped(id),
            None => {
                debug!(category = %filter, "no chip for category");
                Ok(None)
            }
        }
    }

    /// Diff `next` against the committed snapshot for `sections`, then make
    /// it the committed snapshot. Nothing changes if any diff fails.
    fn commit(&mut self, next: Snapshot, sections: &[Section]) -> Result<Commit, SnapshotError> {
        let scripts = sections
            .iter()
            .map(|section| diff(&self.committed, &next, *section))
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        for script in &scripts {
            info!(version = next.version(), "commit {}", script.summary());
            self.history.push_back(CommitRecord {
                version: next.version(),
                section: script.section,
                inserts: script.insert_count(),
                removes: script.remove_count(),
                moves: script.move_count(),
                committed_at: now,
            });
        }
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }

        self.committed = next;
        Ok(Commit {
            version: self.committed.version(),
            scripts,
        })
    }

    /// Forward a commit's scripts to a renderer, in section order
    pub fn commit_to<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        commit: &Commit,
    ) -> Result<(), ApplyError> {
        for script in &commit.scripts {
            renderer.commit(script.section, script, &self.committed)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Read-only inspection
    // ------------------------------------------------------------------------

    pub fn current_snapshot(&self) -> &Snapshot {
        &self.committed
    }

    pub fn item_at(&self, section: Section, index: usize) -> Option<&Item> {
        self.committed.item_at(section, index)
    }

    /// Entry shown at a row of the list section
    pub fn entry_at(&self, index: usize) -> Option<&Entry> {
        self.item_at(Section::EntryList, index)
            .and_then(Item::as_entry)
    }

    pub fn highlighted_chip(&self) -> Option<ItemId> {
        self.selection.highlighted()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn selected_category(&self) -> &CategoryFilter {
        self.filter.selected()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn history(&self) -> impl Iterator<Item = &CommitRecord> {
        self.history.iter()
    }

    pub fn last_error(&self) -> Option<&NetworkFailure> {
        self.last_error.as_ref()
    }
}

// ============================================================================
// TESTS
// ============================================================================

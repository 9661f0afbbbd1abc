// ⚖️ Reconciliation Engine - Minimal edits between two snapshots
//
// Identity-based reconciliation of one section:
//   1. identities only in `old`   -> Remove, descending old index
//   2. identities in both         -> Move, unless part of the longest
//                                    subsequence already in relative order
//   3. identities only in `new`   -> Insert, ascending new index
//
// Scripts are applied sequentially, in order, to the rendered list.
// Every index in an op refers to the list as it stands when that op runs:
// removes use old indices (descending keeps them valid), inserts land on
// their final new index (everything before them is already in place).
//
// The engine holds no state. Same (old, new) in, same script out.

use crate::error::{ApplyError, SnapshotError};
use crate::snapshot::{ItemId, Section, Snapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// ============================================================================
// EDIT SCRIPT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// Insert the item with this identity (payload lives in the new snapshot)
    Insert { id: ItemId, at: usize },
    Remove { at: usize },
    /// Remove at `from`, then insert at `to` in the shortened list
    Move { from: usize, to: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditScript {
    pub section: Section,
    pub ops: Vec<EditOp>,
}

impl EditScript {
    pub fn empty(section: Section) -> Self {
        EditScript {
            section,
            ops: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn insert_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Insert { .. }))
            .count()
    }

    pub fn remove_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Remove { .. }))
            .count()
    }

    pub fn move_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Move { .. }))
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} inserts, {} removes, {} moves",
            self.section,
            self.insert_count(),
            self.remove_count(),
            self.move_count()
        )
    }
}

// ============================================================================
// DIFF
// ============================================================================

/// Edit script turning `old`'s section into `new`'s.
///
/// Snapshots already guarantee unique identities, so for real snapshots
/// this only errors if that guarantee was bypassed.
pub fn diff(old: &Snapshot, new: &Snapshot, section: Section) -> Result<EditScript, SnapshotError> {
    diff_ids(section, old.item_ids(section), new.item_ids(section))
}

/// Edit script between two raw identity sequences.
///
/// A repeated identity in either sequence is reported as `DuplicateIdentity`.
pub fn diff_ids(
    section: Section,
    old: &[ItemId],
    new: &[ItemId],
) -> Result<EditScript, SnapshotError> {
    let old_index = index_positions(section, old)?;
    let new_index = index_positions(section, new)?;

    let mut ops = Vec::new();

    // 1. Removals, back to front
    for (at, id) in old.iter().enumerate().rev() {
        if !new_index.contains_key(id) {
            ops.push(EditOp::Remove { at });
        }
    }

    // 2. Survivors: `working` is the list after removals (old order),
    //    `target` is the same set in new order
    let mut working: Vec<ItemId> = old
        .iter()
        .filter(|id| new_index.contains_key(*id))
        .copied()
        .collect();
    let target: Vec<ItemId> = new
        .iter()
        .filter(|id| old_index.contains_key(*id))
        .copied()
        .collect();

    let stable = stable_identities(&working, &target);

    for (i, id) in target.iter().enumerate() {
        if stable.contains(id) {
            continue;
        }
        let Some(from) = working.iter().position(|candidate| candidate == id) else {
            continue;
        };
        working.remove(from);

        // Directly after its predecessor in the target order
        let to = match i.checked_sub(1) {
            Some(prev) => working
                .iter()
                .position(|candidate| *candidate == target[prev])
                .map_or(0, |pos| pos + 1),
            None => 0,
        };
        working.insert(to, *id);

        if from != to {
            ops.push(EditOp::Move { from, to });
        }
    }

    // 3. Insertions, front to back
    for (at, id) in new.iter().enumerate() {
        if !old_index.contains_key(id) {
            ops.push(EditOp::Insert { id: *id, at });
        }
    }

    Ok(EditScript { section, ops })
}

fn index_positions(
    section: Section,
    ids: &[ItemId],
) -> Result<HashMap<ItemId, usize>, SnapshotError> {
    let mut positions = HashMap::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        if positions.insert(*id, pos).is_some() {
            return Err(SnapshotError::DuplicateIdentity { id: *id, section });
        }
    }
    Ok(positions)
}

/// Identities that keep their relative order: the longest common
/// subsequence of `working` and `target`.
///
/// Both are permutations of the same set, so the LCS is the longest
/// increasing run of `working` positions read in `target` order.
fn stable_identities(working: &[ItemId], target: &[ItemId]) -> HashSet<ItemId> {
    let position: HashMap<ItemId, usize> = working
        .iter()
        .enumerate()
        .map(|(pos, id)| (*id, pos))
        .collect();
    let sequence: Vec<usize> = target
        .iter()
        .filter_map(|id| position.get(id).copied())
        .collect();

    longest_increasing(&sequence)
        .into_iter()
        .map(|i| target[i])
        .collect()
}

/// Indices (into `seq`) of one longest strictly increasing subsequence.
///
/// Patience sorting with predecessor links; ties resolve the same way on
/// every call.
fn longest_increasing(seq: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < value);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = prev[i];
    }
    run.reverse();
    run
}

// ============================================================================
// APPLY
// ============================================================================

/// Apply a script, op by op, to a rendered identity list.
///
/// Renderers use this to keep their own copy of a section in step with the
/// committed snapshot. On error the list is left as it was before the
/// failing op.
pub fn apply_script(list: &mut Vec<ItemId>, script: &EditScript) -> Result<(), ApplyError> {
    for op in &script.ops {
        match *op {
            EditOp::Remove { at } => {
                if at >= list.len() {
                    return Err(ApplyError::OutOfRange { index: at, len: list.len() });
                }
                list.remove(at);
            }
            EditOp::Move { from, to } => {
                if from >= list.len() {
                    return Err(ApplyError::OutOfRange { index: from, len: list.len() });
                }
                if to >= list.len() {
                    return Err(ApplyError::OutOfRange { index: to, len: list.len() });
                }
                let id = list.remove(from);
                list.insert(to, id);
            }
            EditOp::Insert { id, at } => {
                if at > list.len() {
                    return Err(ApplyError::OutOfRange { index: at, len: list.len() });
                }
                if list.contains(&id) {
                    return Err(ApplyError::AlreadyPresent(id));
                }
                list.insert(at, id);
            }
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

// Dex Board - Core Library
// Snapshot-based reconciliation of a sectioned, filterable entry collection.
// Front ends (terminal, HTTP) live in the binaries.

pub mod board;
pub mod config;
pub mod entry;
pub mod error;
pub mod filter;
pub mod logging;
pub mod reconciliation;
pub mod selection;
pub mod snapshot;
pub mod source;

// Re-export commonly used types
pub use board::{Board, Commit, CommitRecord, RenderedList, Renderer, HISTORY_LIMIT};
pub use config::{BoardConfig, LogFormat, LogSettings};
pub use entry::{CategoryFilter, CategoryLabel, Entry, EntryStore};
pub use error::{ApplyError, ConfigError, LoggingError, NetworkFailure, SnapshotError};
pub use filter::FilterController;
pub use logging::init_logging;
pub use reconciliation::{apply_script, diff, diff_ids, EditOp, EditScript};
pub use selection::{default_selection, SelectionState, SelectionTracker};
pub use snapshot::{Item, ItemId, ItemKind, Section, Snapshot, SnapshotBuilder};
pub use source::{load_entries, parse_entries, EntrySource, FetchOutcome, FileSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

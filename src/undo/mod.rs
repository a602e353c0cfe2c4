//! The branching, persistent undo engine (spec §1-§9).
//!
//! Submodules mirror the spec's module breakdown: [`codec`] is the raw
//! binary primitives, [`entry`]/[`header`] are the tree's data, [`tree`]
//! is the tree itself (saving, trimming, freeing), [`replayer`] applies
//! one header, [`navigator`] walks the tree (undo/redo/time travel/views),
//! and [`persistence`] reads and writes the undo file.

pub mod codec;
pub mod entry;
pub mod header;
pub mod navigator;
pub mod persistence;
pub mod replayer;
pub mod tree;

pub use entry::{LineSnapshot, UndoEntry};
pub use header::{HeaderFlags, HeaderId, UndoHeader};
pub use navigator::{TimeMode, TimeUnit, UndoListEntry, UndoTreeNode, UndoTreeView};
pub use persistence::{read_undo_file, read_undo_file_for_lines, write_undo_file, write_undo_file_for_lines};
pub use tree::{SaveOutcome, UndoTree};

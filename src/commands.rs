//! Host-facing undo commands (spec §6.3): `:undo`, `:redo`, `:undolist`,
//! `:earlier`/`:later`, `:undojoin`, `undofile()` path resolution, and
//! `undotree()`.
//!
//! One function per command, called directly by a host editor's dispatch
//! table rather than parsed from a command-line string — an undo-engine
//! crate has no business owning a command parser/registry.

use std::path::{Path, PathBuf};

use crate::collab::{BufferState, CursorState, ExtmarkStore, LineStore};
use crate::error::{EditorError, ErrorType, Result};
use crate::undo::{TimeMode, TimeUnit, UndoListEntry, UndoTree, UndoTreeView};

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Moved { applied: u32 },
    List(Vec<UndoListEntry>),
    Tree(UndoTreeView),
    Joined,
}

/// `u` / `:undo [count]` (spec §6.3).
pub fn undo<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    tree: &mut UndoTree,
    buf: &mut L,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
    count: u32,
) -> Result<CommandOutcome> {
    let applied = tree.undo(buf, extmarks, cursor, state, count)?;
    Ok(CommandOutcome::Moved { applied })
}

/// `<C-r>` / `:redo [count]` (spec §6.3).
pub fn redo<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    tree: &mut UndoTree,
    buf: &mut L,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
    count: u32,
) -> Result<CommandOutcome> {
    let applied = tree.redo(buf, extmarks, cursor, state, count)?;
    Ok(CommandOutcome::Moved { applied })
}

/// `:undo N`: jump to the header with sequence number `seq` (spec §6.3).
pub fn undo_to_seq<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    tree: &mut UndoTree,
    buf: &mut L,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
    seq: u32,
) -> Result<CommandOutcome> {
    let applied = tree.time_step(buf, extmarks, cursor, state, TimeUnit::Seq, TimeMode::Absolute, seq as i64)?;
    Ok(CommandOutcome::Moved { applied })
}

/// `:earlier N[smhdf]`: step `amount` units toward the past (spec §6.3,
/// §4.3.1). `amount` is given as a positive magnitude.
pub fn earlier<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    tree: &mut UndoTree,
    buf: &mut L,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
    unit: TimeUnit,
    amount: i64,
) -> Result<CommandOutcome> {
    let applied = tree.time_step(buf, extmarks, cursor, state, unit, TimeMode::Relative, -amount.abs())?;
    Ok(CommandOutcome::Moved { applied })
}

/// `:later N[smhdf]`: step `amount` units toward the future (spec §6.3).
pub fn later<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    tree: &mut UndoTree,
    buf: &mut L,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
    unit: TimeUnit,
    amount: i64,
) -> Result<CommandOutcome> {
    let applied = tree.time_step(buf, extmarks, cursor, state, unit, TimeMode::Relative, amount.abs())?;
    Ok(CommandOutcome::Moved { applied })
}

/// `:undolist` (spec §6.3).
pub fn undolist(tree: &UndoTree) -> CommandOutcome {
    CommandOutcome::List(tree.undo_list())
}

/// `undotree()` (spec §6.3).
pub fn undotree(tree: &UndoTree) -> CommandOutcome {
    CommandOutcome::Tree(tree.undo_tree())
}

/// `:undojoin`: fold the next change into the current header instead of
/// starting a new one. Refuses if there is no current header to join,
/// mirroring the original's "Undo is not allowed right after undo" guard.
pub fn undojoin(tree: &mut UndoTree) -> Result<CommandOutcome> {
    if tree.new_head.is_none() {
        return Err(EditorError::new(
            ErrorType::Execution,
            "E790",
            "nothing to undojoin with",
        ));
    }
    tree.synced = false;
    Ok(CommandOutcome::Joined)
}

/// `undofile(name)` path resolution (spec §6.3), supplemented from
/// `u_get_undo_file_name`: the undo file for `path` sits alongside it as a
/// dotfile, `.<basename>.un~`.
pub fn undo_file_path(path: &Path) -> PathBuf {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(".{base}.un~"))
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

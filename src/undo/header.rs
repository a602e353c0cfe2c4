//! `UndoHeader` — one undoable step on the tree (spec §3.1).

use super::entry::UndoEntry;
use crate::collab::{ExtmarkUndoObject, Position, VisualRegion, NMARKS};
use bitflags::bitflags;

bitflags! {
    /// Snapshot of buffer flags *before* the header's change (spec §3.1,
    /// §9 "Flags carry pre-edit state"). Bit assignments taken from
    /// `original_source/src/nvim/undo.c` (`UH_CHANGED`, `UH_EMPTYBUF`,
    /// `UH_RELOAD`), which spec.md leaves unspecified.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u16 {
        const CHANGED  = 0b001;
        const EMPTYBUF = 0b010;
        const RELOAD   = 0b100;
    }
}

/// Opaque arena index identifying a header. Distinct from `seq`: `seq` is
/// the user-visible, monotonic, never-reused sequence number and the
/// on-disk pointer encoding (spec §4.4, §9); `HeaderId` is purely an
/// implementation detail of the in-memory arena and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderId(pub u32);

/// One step on the undo tree (spec §3.1).
#[derive(Debug, Clone)]
pub struct UndoHeader {
    pub seq: u32,
    pub time: u64,
    pub save_nr: u32,
    pub cursor: Position,
    pub cursor_vcol: i32,
    pub flags: HeaderFlags,
    pub named_marks: [Position; NMARKS],
    pub visual: VisualRegion,
    /// Newest-first: saves within one sync push to the front.
    pub entries: Vec<UndoEntry>,
    pub extmarks: Vec<ExtmarkUndoObject>,

    pub prev: Option<HeaderId>,
    pub next: Option<HeaderId>,
    pub alt_prev: Option<HeaderId>,
    pub alt_next: Option<HeaderId>,
}

impl UndoHeader {
    pub fn new(seq: u32, time: u64, cursor: Position, cursor_vcol: i32, flags: HeaderFlags) -> Self {
        Self {
            seq,
            time,
            save_nr: 0,
            cursor,
            cursor_vcol,
            flags,
            named_marks: [Position::default(); NMARKS],
            visual: VisualRegion::default(),
            entries: Vec::new(),
            extmarks: Vec::new(),
            prev: None,
            next: None,
            alt_prev: None,
            alt_next: None,
        }
    }

    /// The entry still awaiting `getbot` resolution, if any (spec §3.1,
    /// §4.1.3). At most one entry per header carries `needs_getbot`.
    pub fn getbot_entry_mut(&mut self) -> Option<&mut UndoEntry> {
        self.entries.iter_mut().find(|e| e.needs_getbot)
    }
}

#[cfg(test)]
#[path = "header_tests.rs"]
mod tests;

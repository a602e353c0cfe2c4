//! `UndoEntry` — one contiguous line-range save (spec §3.1).

use crate::collab::Line;

/// Owns the lines captured from `LineStore` for one entry (spec §3.1,
/// "LineSnapshot"). A thin newtype rather than a bare `Vec` so memory
/// accounting (`estimated_size`) has somewhere to live, mirroring
/// `history::EditOperation::estimated_size` in the teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSnapshot(pub Vec<String>);

impl LineSnapshot {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn estimated_size(&self) -> usize {
        self.0.iter().map(|l| l.len() + 1).sum::<usize>() + 32
    }
}

/// One contiguous line-range save within a header (spec §3.1, §4.1).
///
/// `bot == 0` is the "unknown, compute later" sentinel resolved by
/// `UndoTree::getbot` (spec §4.1.3) — not the same as an out-of-range
/// value, which would be a corruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub top: Line,
    pub bot: Line,
    pub size: u32,
    pub lcount: Line,
    pub lines: LineSnapshot,
    /// Set on exactly the one entry per header whose `bot` is still
    /// deferred (spec §3.1 `getbot_entry`). Tracked per-entry rather than
    /// as a header-level index so the entry can move within
    /// `UndoHeader::entries` (coalescing moves entries to the front)
    /// without invalidating a stored index.
    pub needs_getbot: bool,
}

impl UndoEntry {
    /// Create a new entry for the range `(top, bot)` captured with
    /// `newbot` semantics (spec §4.1.1, §4.1.4): `newbot != 0` uses it
    /// directly, `bot` past the current line count resolves to the
    /// "to end of buffer" sentinel `0`, otherwise `bot` is deferred.
    pub fn new_for_save(top: Line, bot: Line, newbot: Line, line_count: Line, size: u32) -> Self {
        let (resolved_bot, lcount, needs_getbot) = if newbot != 0 {
            (newbot, 0, false)
        } else if bot > line_count {
            (0, 0, false)
        } else {
            (0, line_count, true)
        };
        Self {
            top,
            bot: resolved_bot,
            size,
            lcount,
            lines: LineSnapshot::empty(),
            needs_getbot,
        }
    }

    /// Resolve `bot` for the "end of buffer" sentinel during replay
    /// (spec §4.2 step 1).
    pub fn resolved_bot(&self, line_count: Line) -> Line {
        if self.bot == 0 {
            line_count + 1
        } else {
            self.bot
        }
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;

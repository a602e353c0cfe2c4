//! `UndoTree` — the per-buffer branching undo tree (spec §3, §4.1, §4.5).
//!
//! Headers live in an arena (`Vec<Option<UndoHeader>>`) addressed by
//! `HeaderId`, per spec §9's design note: the four-way-linked header graph
//! (`prev`/`next`/`alt_prev`/`alt_next`) is awkward under strict ownership,
//! so links are optional arena indices rather than `Box`/`Rc` pointers.
//! `seq` remains the separate, user-visible, never-reused counter used for
//! navigation targets and on-disk pointer encoding (spec §4.4, §9).

use super::entry::UndoEntry;
use super::header::{HeaderFlags, HeaderId, UndoHeader};
use crate::collab::{CancelFlag, Line, LineStore, Position, VisualRegion, NMARKS};
use crate::error::{EditorError, ErrorType, Result};

/// Result of a successful `save` call (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new header was created.
    NewHeader,
    /// An existing single-line entry was reused (spec §4.1.2).
    Coalesced,
    /// An entry was appended to the current (unsynced) header.
    Appended,
    /// `undolevels < 0`: undo is disabled, nothing was recorded
    /// (spec §9, open question).
    NoUndo,
}

/// The per-buffer undo tree (spec §3.1).
pub struct UndoTree {
    arena: Vec<Option<UndoHeader>>,
    free_list: Vec<HeaderId>,

    pub old_head: Option<HeaderId>,
    pub new_head: Option<HeaderId>,
    pub cur_head: Option<HeaderId>,

    pub synced: bool,
    pub numhead: u32,
    pub seq_last: u32,
    pub seq_cur: u32,
    pub save_nr_last: u32,
    pub save_nr_cur: u32,
    pub time_cur: u64,

    /// `'undolevels'`: how many headers to retain (spec §4.1.1). Negative
    /// disables undo recording entirely (spec §9, open question).
    pub undolevels: i64,

    /// Saved line for the `U` (restore-line) command (spec §4.1).
    pub line_ptr: Option<String>,
    pub line_lnum: Line,
    pub line_colnr: u32,

    /// Per-tree tree-walk coloring marks, parallel to `arena` (spec §9:
    /// "in a pure rewrite it should be per-tree to keep trees independent
    /// and testable in isolation"). Index `i` corresponds to
    /// `HeaderId(i as u32)`. `0` means "unvisited".
    walk_marks: Vec<u32>,
    last_mark: u32,
}

impl UndoTree {
    pub fn new(undolevels: i64) -> Self {
        Self {
            arena: Vec::new(),
            free_list: Vec::new(),
            old_head: None,
            new_head: None,
            cur_head: None,
            synced: true,
            numhead: 0,
            seq_last: 0,
            seq_cur: 0,
            save_nr_last: 0,
            save_nr_cur: 0,
            time_cur: 0,
            undolevels,
            line_ptr: None,
            line_lnum: 0,
            line_colnr: 0,
            walk_marks: Vec::new(),
            last_mark: 0,
        }
    }

    // -- arena plumbing -----------------------------------------------

    pub fn header(&self, id: HeaderId) -> &UndoHeader {
        self.arena[id.0 as usize]
            .as_ref()
            .expect("HeaderId referenced a freed slot")
    }

    pub fn header_mut(&mut self, id: HeaderId) -> &mut UndoHeader {
        self.arena[id.0 as usize]
            .as_mut()
            .expect("HeaderId referenced a freed slot")
    }

    pub(super) fn alloc_header(&mut self, header: UndoHeader) -> HeaderId {
        if let Some(id) = self.free_list.pop() {
            self.arena[id.0 as usize] = Some(header);
            self.walk_marks[id.0 as usize] = 0;
            id
        } else {
            let id = HeaderId(self.arena.len() as u32);
            self.arena.push(Some(header));
            self.walk_marks.push(0);
            id
        }
    }

    fn free_slot(&mut self, id: HeaderId) {
        self.arena[id.0 as usize] = None;
        self.free_list.push(id);
    }

    /// Headers reachable from `old_head` via any combination of
    /// `prev`/`alt_*` traversals (spec §3.2 invariant 3, used by tests).
    pub fn reachable_headers(&self) -> Vec<HeaderId> {
        let mut out = Vec::new();
        let mut stack: Vec<HeaderId> = self.old_head.into_iter().collect();
        let mut seen = vec![false; self.arena.len()];
        while let Some(id) = stack.pop() {
            if seen[id.0 as usize] {
                continue;
            }
            seen[id.0 as usize] = true;
            out.push(id);
            let h = self.header(id);
            for link in [h.prev, h.next, h.alt_prev, h.alt_next] {
                if let Some(l) = link {
                    if !seen[l.0 as usize] {
                        stack.push(l);
                    }
                }
            }
        }
        out
    }

    /// Fresh monotonic tree-walk marker (spec §4.3, §9).
    pub fn next_mark(&mut self) -> u32 {
        self.last_mark += 1;
        self.last_mark
    }

    pub fn walk_mark(&self, id: HeaderId) -> u32 {
        self.walk_marks[id.0 as usize]
    }

    pub fn set_walk_mark(&mut self, id: HeaderId, mark: u32) {
        self.walk_marks[id.0 as usize] = mark;
    }

    // -- save protocol (spec §4.1) --------------------------------------

    /// `save(top, bot, newbot, reload)` (spec §4.1).
    #[allow(clippy::too_many_arguments)]
    pub fn save<L: LineStore>(
        &mut self,
        buf: &L,
        top: Line,
        bot: Line,
        newbot: Line,
        reload: bool,
        cursor: Position,
        cursor_vcol: i32,
        flags_before: HeaderFlags,
        named_marks: [Position; NMARKS],
        visual: VisualRegion,
        time: u64,
        cancel: &CancelFlag,
    ) -> Result<SaveOutcome> {
        let line_count = buf.line_count();
        if top >= bot || bot > line_count + 1 {
            return Err(EditorError::new(
                ErrorType::Execution,
                "E881",
                "Line count changed unexpectedly",
            ));
        }

        // Single-line save: remember the line for the `U` command.
        if top + 2 == bot {
            self.line_ptr = Some(buf.get(top + 1).to_string());
            self.line_lnum = top + 1;
            self.line_colnr = cursor.col;
        }

        let size = bot - top - 1;

        let outcome = if self.synced {
            if self.undolevels >= 0 {
                self.create_new_header(cursor, cursor_vcol, flags_before, named_marks, visual, time);
                SaveOutcome::NewHeader
            } else {
                self.synced = false;
                return Ok(SaveOutcome::NoUndo);
            }
        } else {
            if self.undolevels < 0 {
                return Ok(SaveOutcome::NoUndo);
            }
            if size == 1 {
                if let Some(outcome) = self.try_coalesce(buf, top, bot, newbot) {
                    return Ok(outcome);
                }
            }
            self.getbot(buf);
            SaveOutcome::Appended
        };

        let new_head_id = self
            .new_head
            .expect("a header must exist once the synced branch has run");

        let mut entry = UndoEntry::new_for_save(top, bot, newbot, buf.line_count(), size);
        for i in 0..size {
            if cancel.is_set() {
                return Err(EditorError::new(
                    ErrorType::Other,
                    "E_CANCELLED",
                    "save cancelled during line capture",
                ));
            }
            entry.lines.0.push(buf.get(top + 1 + i).to_string());
        }

        let header = self.header_mut(new_head_id);
        header.entries.insert(0, entry);
        if reload {
            header.flags |= HeaderFlags::RELOAD;
        }
        self.synced = false;

        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_new_header(
        &mut self,
        cursor: Position,
        cursor_vcol: i32,
        flags: HeaderFlags,
        named_marks: [Position; NMARKS],
        visual: VisualRegion,
        time: u64,
    ) {
        let mut old_curhead = self.cur_head.take();
        if let Some(oc) = old_curhead {
            self.new_head = self.header(oc).next;
        }

        while (self.numhead as i64) > self.undolevels {
            let Some(candidate) = self.old_head else {
                break;
            };
            if Some(candidate) == old_curhead {
                self.free_branch(candidate, &mut old_curhead);
            } else if self.header(candidate).alt_next.is_none() {
                self.free_header(candidate, &mut old_curhead);
            } else {
                let mut last = candidate;
                while let Some(next_alt) = self.header(last).alt_next {
                    last = next_alt;
                }
                self.free_branch(last, &mut old_curhead);
            }
        }

        let new_id = self.alloc_header(UndoHeader::new(0, time, cursor, cursor_vcol, flags));
        {
            let h = self.header_mut(new_id);
            h.named_marks = named_marks;
            h.visual = visual;
            h.prev = None;
            h.next = self.new_head;
            h.alt_next = old_curhead;
        }

        if let Some(oc) = old_curhead {
            let oc_alt_prev = self.header(oc).alt_prev;
            self.header_mut(new_id).alt_prev = oc_alt_prev;
            if let Some(ap) = oc_alt_prev {
                self.header_mut(ap).alt_next = Some(new_id);
            }
            self.header_mut(oc).alt_prev = Some(new_id);
            if self.old_head == Some(oc) {
                self.old_head = Some(new_id);
            }
        } else {
            self.header_mut(new_id).alt_prev = None;
        }

        if let Some(nh) = self.new_head {
            self.header_mut(nh).prev = Some(new_id);
        }

        self.seq_last += 1;
        self.header_mut(new_id).seq = self.seq_last;
        self.seq_cur = self.seq_last;
        self.time_cur = time;

        self.new_head = Some(new_id);
        if self.old_head.is_none() {
            self.old_head = Some(new_id);
        }
        self.numhead += 1;
    }

    /// Single-line coalescing (spec §4.1.2).
    fn try_coalesce<L: LineStore>(
        &mut self,
        buf: &L,
        top: Line,
        bot: Line,
        newbot: Line,
    ) -> Option<SaveOutcome> {
        let new_head_id = self.new_head?;
        let line_count = buf.line_count();

        let entries_len = self.header(new_head_id).entries.len();
        let scan_n = entries_len.min(10);
        let mut reuse_idx = None;
        for i in 0..scan_n {
            let e = &self.header(new_head_id).entries[i];
            let drift = if e.needs_getbot {
                e.lcount != line_count
            } else {
                let bot_eff = if e.bot == 0 { line_count + 1 } else { e.bot };
                e.top + e.size + 1 != bot_eff
            };
            let overlap = e.size > 1 && top >= e.top && top + 2 <= e.top + e.size + 1;
            if drift || overlap {
                break;
            }
            if e.size == 1 && e.top == top {
                reuse_idx = Some(i);
                break;
            }
        }

        let idx = reuse_idx?;

        if idx > 0 {
            self.getbot(buf);
            self.synced = false;
        }

        let header = self.header_mut(new_head_id);
        let mut entry = header.entries.remove(idx);
        if newbot != 0 {
            entry.bot = newbot;
            entry.needs_getbot = false;
        } else if bot > line_count {
            entry.bot = 0;
            entry.needs_getbot = false;
        } else {
            entry.lcount = line_count;
            entry.needs_getbot = true;
        }
        header.entries.insert(0, entry);
        self.synced = false;
        Some(SaveOutcome::Coalesced)
    }

    /// Resolve a deferred `bot` on the newest header's `getbot_entry`
    /// (spec §4.1.3). Mirrors `u_getbot`'s non-fatal fallback: a missing
    /// entry list or an out-of-range result is treated as recoverable
    /// corruption, not a hard error.
    pub fn getbot<L: LineStore>(&mut self, buf: &L) {
        let Some(new_head_id) = self.new_head else {
            return;
        };
        if self.header(new_head_id).entries.is_empty() {
            return;
        }
        let line_count = buf.line_count();
        let header = self.header_mut(new_head_id);
        if let Some(entry) = header.getbot_entry_mut() {
            let extra = line_count as i64 - entry.lcount as i64;
            let bot = entry.top as i64 + entry.size as i64 + 1 + extra;
            entry.bot = if bot < 1 || bot as u32 > line_count {
                entry.top + 1
            } else {
                bot as u32
            };
            entry.needs_getbot = false;
        }
        self.synced = true;
    }

    /// Record that the buffer has just been written to disk (spec §4.3.1,
    /// `'FileSaves'` time unit): bump the save counter and stamp it onto
    /// the header at the tip, the way `write_viminfo`-adjacent bookkeeping
    /// stamps `uh_save_nr` in the original.
    pub fn mark_saved(&mut self) {
        self.save_nr_last += 1;
        self.save_nr_cur = self.save_nr_last;
        if let Some(h) = self.new_head {
            self.header_mut(h).save_nr = self.save_nr_last;
        }
    }

    // -- lifetime / freeing (spec §4.5) ---------------------------------

    /// Detach `id` from both spine and sibling list, freeing its alt-next
    /// branch along the way (it can never be reached again), and free its
    /// entries. Mirrors `u_freeheader` exactly, including its
    /// "repoint every alt sibling of `prev`" step, since that step is not
    /// obvious from spec.md's prose alone.
    pub fn free_header(&mut self, id: HeaderId, out: &mut Option<HeaderId>) {
        if let Some(alt_next) = self.header(id).alt_next {
            self.free_branch(alt_next, out);
        }
        if let Some(alt_prev) = self.header(id).alt_prev {
            self.header_mut(alt_prev).alt_next = None;
        }

        let next = self.header(id).next;
        let prev = self.header(id).prev;

        if next.is_none() {
            self.old_head = prev;
        } else {
            self.header_mut(next.unwrap()).prev = prev;
        }

        if prev.is_none() {
            self.new_head = next;
        } else {
            let mut uhap = prev;
            while let Some(hid) = uhap {
                self.header_mut(hid).next = next;
                uhap = self.header(hid).alt_next;
            }
        }

        self.free_entries(id, out);
    }

    /// Free an alternate branch and everything reachable through its
    /// `prev` chain and their `alt_next` siblings (mirrors `u_freebranch`).
    pub fn free_branch(&mut self, id: HeaderId, out: &mut Option<HeaderId>) {
        if Some(id) == self.old_head {
            while let Some(oh) = self.old_head {
                self.free_header(oh, out);
            }
            return;
        }

        if let Some(alt_prev) = self.header(id).alt_prev {
            self.header_mut(alt_prev).alt_next = None;
        }

        let mut next = Some(id);
        while let Some(cur) = next {
            let alt_next = self.header(cur).alt_next;
            if let Some(an) = alt_next {
                self.free_branch(an, out);
            }
            next = self.header(cur).prev;
            self.free_entries(cur, out);
        }
    }

    fn free_entries(&mut self, id: HeaderId, out: &mut Option<HeaderId>) {
        if self.cur_head == Some(id) {
            self.cur_head = None;
        }
        if self.new_head == Some(id) {
            self.new_head = None;
        }
        if *out == Some(id) {
            *out = None;
        }
        self.free_slot(id);
        self.numhead = self.numhead.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;

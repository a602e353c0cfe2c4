//! Navigating the undo tree: linear undo/redo, time travel, and the
//! structured views behind `:undolist`/`undotree()` (spec §4.3, §6.3).
//!
//! Pointer convention (derived from `create_new_header`, not spec.md's
//! prose, which is looser): `next` always points toward an *older* header
//! on the same spine, `prev` toward a *newer* one. `cur_head == None`
//! means the buffer reflects the newest state (`new_head`) with nothing
//! pending redo; `cur_head == Some(h)` means `h` is the most recently
//! undone header — redoing reapplies `h` and nothing else has changed.

use super::header::HeaderId;
use super::replayer;
use super::tree::UndoTree;
use crate::collab::{BufferState, CursorState, Direction, ExtmarkStore, LineStore};
use crate::error::Result;

/// Unit used by `time_step` to measure "how far" (spec §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seq,
    Seconds,
    FileSaves,
}

/// Whether `time_step`'s `amount` is a target value or an offset from the
/// current position (spec §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Absolute,
    Relative,
}

/// One row of `:undolist` (spec §6.3): every header reachable from the
/// tree, in seq order, regardless of which spine it sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoListEntry {
    pub seq: u32,
    pub time: u64,
    pub save_nr: u32,
    pub changes: u32,
}

/// One node of the `undotree()` view (spec §6.3): a spine plus, at each
/// node, its alternate branches as nested spines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoTreeNode {
    pub seq: u32,
    pub time: u64,
    pub save_nr: u32,
    pub newhead: bool,
    pub curhead: bool,
    pub alt: Vec<UndoTreeNode>,
}

/// The full `undotree()` view (spec §6.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoTreeView {
    pub seq_last: u32,
    pub seq_cur: u32,
    pub save_last: u32,
    pub save_cur: u32,
    pub synced: bool,
    pub entries: Vec<UndoTreeNode>,
}

impl UndoTree {
    /// Undo `count` headers (spec §4.3: `:undo [count]`). Returns how many
    /// were actually applied — fewer than `count` at the oldest header.
    pub fn undo<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        count: u32,
    ) -> Result<u32> {
        let mut done = 0;
        for _ in 0..count {
            let target = match self.cur_head {
                None => self.new_head,
                Some(h) => self.header(h).next,
            };
            let Some(target) = target else { break };
            replayer::apply_header(
                buf,
                self.header_mut(target),
                Direction::Undo,
                extmarks,
                cursor,
                state,
            )?;
            let (seq, time, save_nr) = {
                let h = self.header(target);
                (h.seq, h.time, h.save_nr)
            };
            self.seq_cur = seq.saturating_sub(1);
            self.time_cur = time;
            self.save_nr_cur = save_nr;
            self.cur_head = Some(target);
            done += 1;
        }
        Ok(done)
    }

    /// Redo `count` headers (spec §4.3: `:redo [count]`).
    pub fn redo<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        count: u32,
    ) -> Result<u32> {
        let mut done = 0;
        for _ in 0..count {
            let Some(target) = self.cur_head else { break };
            replayer::apply_header(
                buf,
                self.header_mut(target),
                Direction::Redo,
                extmarks,
                cursor,
                state,
            )?;
            let (seq, time, save_nr, prev) = {
                let h = self.header(target);
                (h.seq, h.time, h.save_nr, h.prev)
            };
            self.seq_cur = seq;
            self.time_cur = time;
            self.save_nr_cur = save_nr;
            self.cur_head = prev;
            done += 1;
        }
        Ok(done)
    }

    /// Undo `count` headers, then discard the branch just undone so it can
    /// never be redone (spec §4.3: `:undo!`-style "forget"). Mirrors
    /// `undo_and_forget` repeatedly freeing the headers above the new
    /// `cur_head`.
    pub fn undo_and_forget<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        count: u32,
    ) -> Result<u32> {
        let done = self.undo(buf, extmarks, cursor, state, count)?;

        let stop_at = self.cur_head;
        let mut cur = self.new_head;
        while let Some(h) = cur {
            if Some(h) == stop_at {
                break;
            }
            let next = self.header(h).next;
            let mut out = None;
            self.free_header(h, &mut out);
            cur = next;
        }
        self.cur_head = None;

        Ok(done)
    }

    /// Walk toward a target `seq`/time/save-count anywhere in the tree —
    /// including onto alternate branches — stopping at the closest header
    /// without overshooting (spec §4.3.1, §4.3.2).
    ///
    /// Mirrors `tree_walk`'s `mark`/`nomark` coloring rather than a linear
    /// `undo`/`redo` loop, because the target may sit on a branch the
    /// current spine doesn't pass through at all. `closest_header` walks
    /// every reachable header in `prev` → `alt_next` → `next` → `alt_prev`
    /// order from `old_head`, picking whichever header is closest to
    /// `target` without passing it (falling back to the closest overshoot
    /// at the ends of the tree). `walk_to` then drives the tree to that
    /// header: a direct chronological `undo`/`redo` run when the target is
    /// reachable that way, otherwise locating which alternate branch holds
    /// it and switching onto it, splicing that branch into the active spine
    /// the same way a fresh edit off an undone header would.
    pub fn time_step<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        unit: TimeUnit,
        mode: TimeMode,
        amount: i64,
    ) -> Result<u32> {
        let current = self.unit_value(unit, self.seq_cur, self.time_cur, self.save_nr_cur);

        let target = match mode {
            TimeMode::Absolute => amount.max(0),
            TimeMode::Relative => (current + amount).max(0),
        };

        let Some(chosen) = self.closest_header(unit, target) else {
            return Ok(0);
        };

        self.walk_to(buf, extmarks, cursor, state, chosen)
    }

    fn unit_value(&self, unit: TimeUnit, seq: u32, time: u64, save_nr: u32) -> i64 {
        match unit {
            TimeUnit::Seq => seq as i64,
            TimeUnit::Seconds => time as i64,
            TimeUnit::FileSaves => save_nr as i64,
        }
    }

    /// Round one of `time_step`: color every header reachable from
    /// `old_head` via `prev` → `alt_next` → `next` → `alt_prev`, tracking
    /// the header whose `unit` value is closest to `target` without going
    /// past it (ties keep the first one found, i.e. the one nearer the
    /// current spine). Falls back to the closest overshoot if nothing is
    /// reachable without passing `target`, matching the original's
    /// "go as far as we can" behavior at the ends of the tree.
    fn closest_header(&mut self, unit: TimeUnit, target: i64) -> Option<HeaderId> {
        let Some(start) = self.old_head else {
            return None;
        };
        let mark = self.next_mark();

        let current = self.unit_value(unit, self.seq_cur, self.time_cur, self.save_nr_cur);
        let going_older = current > target;

        let mut best: Option<HeaderId> = None;
        let mut best_value: Option<i64> = None;
        let mut best_overshoot: Option<HeaderId> = None;
        let mut best_overshoot_value: Option<i64> = None;

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.walk_mark(id) == mark {
                continue;
            }
            self.set_walk_mark(id, mark);

            let h = self.header(id);
            let value = self.unit_value(unit, h.seq, h.time, h.save_nr);
            let within = if going_older {
                value >= target
            } else {
                value <= target
            };
            if within {
                let better = match best_value {
                    None => true,
                    Some(bv) => {
                        if going_older {
                            value < bv
                        } else {
                            value > bv
                        }
                    }
                };
                if better {
                    best = Some(id);
                    best_value = Some(value);
                }
            } else {
                let better = match best_overshoot_value {
                    None => true,
                    Some(bv) => {
                        if going_older {
                            value > bv
                        } else {
                            value < bv
                        }
                    }
                };
                if better {
                    best_overshoot = Some(id);
                    best_overshoot_value = Some(value);
                }
            }

            let h = self.header(id);
            for link in [h.prev, h.alt_next, h.next, h.alt_prev] {
                if let Some(l) = link {
                    if self.walk_mark(l) != mark {
                        stack.push(l);
                    }
                }
            }
        }

        best.or(best_overshoot)
    }

    /// Is `target` currently the most recently applied header — i.e. does
    /// the live buffer reflect exactly up through `target`'s change?
    fn is_applied(&self, target: HeaderId) -> bool {
        let target_prev = self.header(target).prev;
        self.cur_head == target_prev && (target_prev.is_some() || self.new_head == Some(target))
    }

    /// How many `redo()` calls would make `target` the applied header, if
    /// it is reachable by repeatedly redoing from the current position
    /// (spec §4.3: redoing always applies `cur_head` itself, then moves
    /// `cur_head` to its `prev`, so `target` becomes applied on exactly the
    /// call that redoes `target`).
    fn redo_distance(&self, target: HeaderId) -> Option<u32> {
        let mut cur = self.cur_head;
        let mut n = 0u32;
        while let Some(h) = cur {
            n += 1;
            if h == target {
                return Some(n);
            }
            cur = self.header(h).prev;
        }
        None
    }

    /// How many `undo()` calls would make `target` the applied header
    /// (`cur_head == target.prev`), if it is reachable by repeatedly
    /// undoing from the current position. Each `undo()` call undoes
    /// whichever header is currently applied and moves the applied header
    /// one step further into the past (toward `next`), so this walks that
    /// chain counting steps *before* reaching `target`, not up through it —
    /// undoing `target` itself would retire it, not apply it.
    fn undo_calls_to_apply(&self, target: HeaderId) -> Option<u32> {
        let mut applied = match self.cur_head {
            None => self.new_head,
            Some(h) => self.header(h).next,
        };
        let mut n = 0u32;
        for _ in 0..=self.numhead {
            let h = applied?;
            if h == target {
                return Some(n);
            }
            n += 1;
            applied = self.header(h).next;
        }
        None
    }

    /// Does `target` belong to the subtree rooted at `start`, following
    /// only `prev`, `alt_next`, and `alt_prev` links? Used to find which
    /// alternate branch (not the shared ancestor chain reached via `next`)
    /// a header belongs to.
    fn in_alt_subtree(&self, start: HeaderId, target: HeaderId) -> bool {
        let mut stack = vec![start];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            let h = self.header(id);
            for link in [h.prev, h.alt_next, h.alt_prev].into_iter().flatten() {
                stack.push(link);
            }
        }
        false
    }

    /// Find a header `a` on the current active spine (`new_head`'s `next`
    /// chain) whose alternate-branch subtree contains `target`, along with
    /// the sibling `entry` that begins that subtree — used when `target` is
    /// not reachable by ordinary chronological undo/redo at all.
    fn locate_branch_entry(&self, target: HeaderId) -> Option<(HeaderId, HeaderId)> {
        let mut cur = self.new_head;
        while let Some(a) = cur {
            let h = self.header(a);
            for sib in [h.alt_next, h.alt_prev].into_iter().flatten() {
                if self.in_alt_subtree(sib, target) {
                    return Some((a, sib));
                }
            }
            cur = self.header(a).next;
        }
        None
    }

    /// Apply `entry` (the entry point of an alternate branch) and make that
    /// branch the active one: `new_head` becomes the tip of `entry`'s own
    /// `prev` chain, mirroring the splice `create_new_header` performs when
    /// a fresh edit starts from an undone alternate (spec §4.1, §4.3.2).
    fn switch_branch<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        entry: HeaderId,
    ) -> Result<u32> {
        replayer::apply_header(buf, self.header_mut(entry), Direction::Redo, extmarks, cursor, state)?;
        let (seq, time, save_nr, prev) = {
            let h = self.header(entry);
            (h.seq, h.time, h.save_nr, h.prev)
        };
        self.seq_cur = seq;
        self.time_cur = time;
        self.save_nr_cur = save_nr;
        self.cur_head = prev;

        let mut tip = entry;
        while let Some(p) = self.header(tip).prev {
            tip = p;
        }
        self.new_head = Some(tip);

        Ok(1)
    }

    /// Second half of `time_step`: drive `undo`/`redo` until the live
    /// buffer reflects `target`, switching onto whichever alternate branch
    /// contains it when ordinary chronological undo/redo on the current
    /// active spine can't reach it (spec §4.3.2).
    fn walk_to<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
        &mut self,
        buf: &mut L,
        extmarks: &mut X,
        cursor: &mut C,
        state: &mut B,
        target: HeaderId,
    ) -> Result<u32> {
        let mut total = 0;
        // Bounded by the tree size: each iteration either finishes or moves
        // onto a different branch, and there are finitely many.
        for _ in 0..=self.numhead {
            if self.is_applied(target) {
                break;
            }
            if let Some(n) = self.redo_distance(target) {
                total += self.redo(buf, extmarks, cursor, state, n)?;
                break;
            }
            if let Some(n) = self.undo_calls_to_apply(target) {
                total += self.undo(buf, extmarks, cursor, state, n)?;
                break;
            }

            // `target` sits on a branch the active spine doesn't pass
            // through. `a` is the header on the active spine whose
            // alternate subtree holds it; reach `a` applied first (if it
            // isn't already), then one more `undo()` retires `a` and lands
            // on the shared ancestor both branches diverge from, ready for
            // `switch_branch` to apply `entry` from there.
            let Some((a, entry)) = self.locate_branch_entry(target) else {
                break;
            };
            if !self.is_applied(a) {
                if let Some(n) = self.redo_distance(a) {
                    total += self.redo(buf, extmarks, cursor, state, n)?;
                } else if let Some(n) = self.undo_calls_to_apply(a) {
                    total += self.undo(buf, extmarks, cursor, state, n)?;
                }
            }
            total += self.undo(buf, extmarks, cursor, state, 1)?;
            total += self.switch_branch(buf, extmarks, cursor, state, entry)?;
        }

        Ok(total)
    }

    /// Every reachable header, in ascending `seq` order (spec §6.3
    /// `undo_list`).
    pub fn undo_list(&self) -> Vec<UndoListEntry> {
        let mut out: Vec<UndoListEntry> = self
            .reachable_headers()
            .into_iter()
            .map(|id| {
                let h = self.header(id);
                UndoListEntry {
                    seq: h.seq,
                    time: h.time,
                    save_nr: h.save_nr,
                    changes: h.entries.len() as u32,
                }
            })
            .collect();
        out.sort_by_key(|e| e.seq);
        out
    }

    /// The full tree, shaped for display (spec §6.3 `undo_tree`).
    pub fn undo_tree(&self) -> UndoTreeView {
        let entries = match self.old_head {
            Some(id) => self.build_spine(id),
            None => Vec::new(),
        };
        UndoTreeView {
            seq_last: self.seq_last,
            seq_cur: self.seq_cur,
            save_last: self.save_nr_last,
            save_cur: self.save_nr_cur,
            synced: self.synced,
            entries,
        }
    }

    fn build_spine(&self, start: HeaderId) -> Vec<UndoTreeNode> {
        let mut out = Vec::new();
        let mut cur = Some(start);
        while let Some(id) = cur {
            out.push(self.build_node(id));
            cur = self.header(id).prev;
        }
        out
    }

    fn build_node(&self, id: HeaderId) -> UndoTreeNode {
        let h = self.header(id);
        let alt = match h.alt_next {
            Some(a) => self.build_spine(a),
            None => Vec::new(),
        };
        UndoTreeNode {
            seq: h.seq,
            time: h.time,
            save_nr: h.save_nr,
            newhead: self.new_head == Some(id),
            curhead: self.cur_head == Some(id),
            alt,
        }
    }
}

#[cfg(test)]
#[path = "navigator_tests.rs"]
mod tests;

//! Applying one header's entries to the live buffer, forward or backward
//! (spec §4.2). Headers are self-inverting: applying a header swaps its
//! stored state (lines, flags, marks, visual region, cursor) with whatever
//! is currently live, so applying the same header again in the opposite
//! direction undoes the swap.

use super::entry::{LineSnapshot, UndoEntry};
use super::header::{HeaderFlags, UndoHeader};
use crate::collab::{BufferState, CursorState, Direction, ExtmarkStore, Line, LineStore, Position};
use crate::error::{EditorError, Result};

/// Apply every entry (and extmark object) of `header` to `buf`, then swap
/// its flags/marks/visual-region/cursor state, in the order appropriate for
/// `direction` (spec §4.2 steps 1-5): entries and extmark objects are
/// stored newest-first, so undoing walks them front-to-back (most recent
/// edit first) and redoing walks them back-to-front.
pub fn apply_header<L: LineStore, X: ExtmarkStore, C: CursorState, B: BufferState>(
    buf: &mut L,
    header: &mut UndoHeader,
    direction: Direction,
    extmarks: &mut X,
    cursor: &mut C,
    state: &mut B,
) -> Result<()> {
    let len = header.entries.len();
    let order: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Undo => Box::new(0..len),
        Direction::Redo => Box::new((0..len).rev()),
    };

    for idx in order {
        apply_entry(buf, &mut header.entries[idx])?;
    }

    let ext_len = header.extmarks.len();
    let ext_order: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Undo => Box::new(0..ext_len),
        Direction::Redo => Box::new((0..ext_len).rev()),
    };
    for idx in ext_order {
        extmarks.apply(&header.extmarks[idx], direction);
    }

    swap_flags(header, state);
    swap_named_marks(header, state);
    swap_visual(header, state);
    restore_cursor(header, cursor);

    Ok(())
}

/// Swap one entry's stored lines with the buffer's current content over
/// the entry's range (spec §4.2 step 1), rejecting a range that has drifted
/// outside the buffer's current bounds (spec §4.2 step 2, §7 kind 2) rather
/// than silently clamping it.
fn apply_entry<L: LineStore>(buf: &mut L, entry: &mut UndoEntry) -> Result<()> {
    let line_count = buf.line_count();
    let bot = entry.resolved_bot(line_count);

    if entry.top > line_count || entry.top >= bot || bot > line_count + 1 {
        return Err(EditorError::corrupt_tree(format!(
            "entry range [{}, {}) is out of bounds for a {}-line buffer",
            entry.top, bot, line_count
        )));
    }

    let old_count = bot - entry.top - 1;

    let mut captured: Vec<String> = Vec::with_capacity(old_count as usize);
    for i in 0..old_count {
        captured.push(buf.get(entry.top + 1 + i).to_string());
    }

    for _ in 0..old_count {
        buf.delete(entry.top + 1);
    }

    let mut after: Line = entry.top;
    for line in &entry.lines.0 {
        buf.append(after, line.clone());
        after += 1;
    }

    let new_count = entry.lines.0.len() as Line;
    entry.lines = LineSnapshot(captured);
    entry.size = new_count;
    entry.bot = entry.top + new_count + 1;
    entry.lcount = 0;
    entry.needs_getbot = false;
    Ok(())
}

/// Swap the header's stored flags with whatever is currently live (spec
/// §4.2 step 3).
fn swap_flags<B: BufferState>(header: &mut UndoHeader, state: &mut B) {
    let live = state.flags_bits();
    state.set_flags_bits(header.flags.bits());
    header.flags = HeaderFlags::from_bits_truncate(live);
}

/// Swap the header's stored named marks with whatever is currently live
/// (spec §4.2 step 4).
fn swap_named_marks<B: BufferState>(header: &mut UndoHeader, state: &mut B) {
    let live = state.named_marks();
    state.set_named_marks(header.named_marks);
    header.named_marks = live;
}

/// Swap the header's stored visual region with whatever is currently live
/// (spec §4.2 step 4).
fn swap_visual<B: BufferState>(header: &mut UndoHeader, state: &mut B) {
    let live = state.visual();
    state.set_visual(header.visual);
    header.visual = live;
}

/// Restore the cursor from the header's stored position (spec §4.2 step
/// 5): if the current cursor sits exactly one line below the header's
/// stored line, nudge it up by one rather than jumping, which reads more
/// naturally after undoing a single-line insertion; otherwise snap to the
/// stored position, dropping virtual column padding when the header was
/// not captured in virtual-edit mode. The header then stores whatever
/// cursor was live before the restore, so replaying it again in the
/// opposite direction puts the cursor back.
fn restore_cursor<C: CursorState>(header: &mut UndoHeader, cursor: &mut C) {
    let current = cursor.get();
    let restored = if header.cursor.lnum + 1 == current.lnum {
        Position {
            lnum: current.lnum - 1,
            col: current.col,
            coladd: current.coladd,
        }
    } else {
        let mut pos = header.cursor;
        if header.cursor_vcol < 0 {
            pos.coladd = 0;
        }
        pos
    };
    cursor.set(restored);
    header.cursor = current;
}

#[cfg(test)]
#[path = "replayer_tests.rs"]
mod tests;

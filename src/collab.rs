//! Collaborator interfaces (spec §6.1).
//!
//! The undo engine does not own the text buffer, the cursor, or extmark
//! storage — it is driven by a host editor that implements these traits.
//! Each trait is deliberately narrow: just the surface the engine actually
//! calls. Concrete, in-memory implementations are provided for tests and
//! for the small demo binary; a real editor supplies its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 1-based line number. `0` is used in a few places as a sentinel ("end of
/// buffer" for `bot`, "no buffer" for `lnum`) per spec §3.1.
pub type Line = u32;

/// Read/write access to the text buffer being undone.
///
/// All line numbers are 1-based, matching the spec's `LineStore` interface
/// (spec §6.1). Implementations are not expected to be efficient for huge
/// files — the engine calls `get`/`replace`/`delete`/`append` one line at a
/// time, the same granularity the original C implementation uses.
pub trait LineStore {
    /// Number of lines currently in the buffer.
    fn line_count(&self) -> Line;

    /// Read the contents of line `lnum` (1-based).
    fn get(&self, lnum: Line) -> &str;

    /// Insert `text` as a new line immediately after `after_lnum`.
    /// `after_lnum == 0` inserts at the start of the buffer.
    fn append(&mut self, after_lnum: Line, text: String);

    /// Delete line `lnum`.
    fn delete(&mut self, lnum: Line);

    /// Replace the contents of line `lnum` with `text`.
    fn replace(&mut self, lnum: Line, text: String);
}

/// Simple `Vec<String>`-backed `LineStore`, sufficient to drive and test
/// the engine end-to-end. Deliberately far simpler than a production
/// editor's rope/gap buffer — the engine only needs whole-line operations.
#[derive(Debug, Clone, Default)]
pub struct VecLineStore {
    lines: Vec<String>,
}

impl VecLineStore {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    pub fn into_vec(self) -> Vec<String> {
        self.lines
    }
}

impl LineStore for VecLineStore {
    fn line_count(&self) -> Line {
        self.lines.len() as Line
    }

    fn get(&self, lnum: Line) -> &str {
        &self.lines[(lnum - 1) as usize]
    }

    fn append(&mut self, after_lnum: Line, text: String) {
        self.lines.insert(after_lnum as usize, text);
    }

    fn delete(&mut self, lnum: Line) {
        self.lines.remove((lnum - 1) as usize);
    }

    fn replace(&mut self, lnum: Line, text: String) {
        self.lines[(lnum - 1) as usize] = text;
    }
}

/// A cursor position: 1-based line, 0-based column, plus "coladd" (virtual
/// space past end of line, used when `'virtualedit'`-style editing is
/// active). Also doubles as the wire `pos` record of spec §6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub lnum: Line,
    pub col: u32,
    pub coladd: u32,
}

impl Position {
    pub const fn new(lnum: Line, col: u32) -> Self {
        Self {
            lnum,
            col,
            coladd: 0,
        }
    }
}

/// Number of named marks (`a`-`z`) carried opaquely by each header, per
/// spec §3.1.
pub const NMARKS: usize = 26;

/// Visual-mode region, serialized as an opaque fixed-size record per spec
/// §1 ("named marks and visual-region bookkeeping ... serialized as opaque
/// fixed-size records").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualRegion {
    pub start: Position,
    pub end: Position,
    pub mode: u32,
    pub curswant: u32,
}

/// Host-provided cursor access.
pub trait CursorState {
    fn get(&self) -> Position;
    fn set(&mut self, pos: Position);
    /// Virtual column, or `-1` when not in virtual-edit mode (spec §4.1.1).
    fn virtual_col(&self) -> i32;
}

/// Minimal in-memory cursor, for tests and the demo binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCursor {
    pos: Position,
    vcol: i32,
}

impl SimpleCursor {
    pub fn new(pos: Position) -> Self {
        Self { pos, vcol: -1 }
    }
}

impl CursorState for SimpleCursor {
    fn get(&self) -> Position {
        self.pos
    }

    fn set(&mut self, pos: Position) {
        self.pos = pos;
    }

    fn virtual_col(&self) -> i32 {
        self.vcol
    }
}

/// An opaque extmark-undo blob. The engine never interprets the bytes
/// (spec §1); it only stores them and hands them back to `ExtmarkStore` at
/// replay time, forward on redo and reverse on undo (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtmarkUndoObject {
    pub kind: u32,
    pub payload: Vec<u8>,
}

/// Direction an extmark (or a header) is being replayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// Host-provided extmark replay.
pub trait ExtmarkStore {
    fn apply(&mut self, undo_obj: &ExtmarkUndoObject, direction: Direction);
}

/// No-op extmark store, for tests and hosts with no extmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExtmarkStore;

impl ExtmarkStore for NullExtmarkStore {
    fn apply(&mut self, _undo_obj: &ExtmarkUndoObject, _direction: Direction) {}
}

/// Wall-clock time source, abstracted so navigator/persistence tests are
/// deterministic (the teacher calls `SystemTime::now()` directly in
/// `history::EditNode`; here that call is pushed behind a trait).
pub trait Clock {
    fn now_seconds(&self) -> u64;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only advances when told to — for reproducible tests of
/// `time_step`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: std::cell::Cell<u64>,
}

impl FixedClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for FixedClock {
    fn now_seconds(&self) -> u64 {
        self.now.get()
    }
}

/// Cooperative cancellation for the line-capture loop in `UndoTree::save`
/// (spec §4.1.4, §5: large saves should be interruptible rather than
/// blocking the host indefinitely). Cheap to check, cheap to clone and
/// share with whatever cancels it (a UI timeout, a signal handler).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Content hashing for the undo file's buffer-identity check (spec §4.4,
/// §6.2): the persisted tree embeds a hash of the buffer it was saved
/// against, and loading refuses to attach it to a buffer whose content
/// hashes differently.
pub trait Hasher {
    fn hash_lines(&self, lines: &[String]) -> [u8; 32];
}

/// SHA-256 over each line's bytes plus a single NUL terminator, mirroring
/// the original's `strlen(p) + 1`-inclusive per-line hash (spec §6.1), so
/// `["ab", "c"]` and `["a", "bc"]` hash differently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash_lines(&self, lines: &[String]) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\0");
        }
        hasher.finalize().into()
    }
}

/// Host-provided access to the buffer-level state a header snapshots
/// alongside its line changes: flags, named marks, and the visual region
/// (spec §3.1, §4.2 steps 3-5). Kept separate from `CursorState` since a
/// host may track the cursor and this bookkeeping through different paths.
pub trait BufferState {
    fn flags_bits(&self) -> u16;
    fn set_flags_bits(&mut self, bits: u16);
    fn named_marks(&self) -> [Position; NMARKS];
    fn set_named_marks(&mut self, marks: [Position; NMARKS]);
    fn visual(&self) -> VisualRegion;
    fn set_visual(&mut self, visual: VisualRegion);
}

/// Minimal in-memory `BufferState`, for tests and the demo binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBufferState {
    flags: u16,
    named_marks: [Position; NMARKS],
    visual: VisualRegion,
}

impl BufferState for SimpleBufferState {
    fn flags_bits(&self) -> u16 {
        self.flags
    }

    fn set_flags_bits(&mut self, bits: u16) {
        self.flags = bits;
    }

    fn named_marks(&self) -> [Position; NMARKS] {
        self.named_marks
    }

    fn set_named_marks(&mut self, marks: [Position; NMARKS]) {
        self.named_marks = marks;
    }

    fn visual(&self) -> VisualRegion {
        self.visual
    }

    fn set_visual(&mut self, visual: VisualRegion) {
        self.visual = visual;
    }
}

#[cfg(test)]
#[path = "collab_tests.rs"]
mod tests;

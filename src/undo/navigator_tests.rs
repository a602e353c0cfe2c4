use super::*;
use crate::collab::{
    CancelFlag, NullExtmarkStore, Position, SimpleBufferState, SimpleCursor, VecLineStore, VisualRegion, NMARKS,
};
use crate::undo::header::HeaderFlags;

fn marks() -> [Position; NMARKS] {
    [Position::default(); NMARKS]
}

fn save_replace_line1(tree: &mut UndoTree, buf: &VecLineStore, time: u64) {
    tree.synced = true;
    tree.save(
        buf,
        0,
        2,
        2,
        false,
        Position::default(),
        -1,
        HeaderFlags::empty(),
        marks(),
        VisualRegion::default(),
        time,
        &CancelFlag::new(),
    )
    .expect("save should succeed");
}

#[test]
fn linear_undo_redo_restores_states() {
    let mut buf = VecLineStore::new(vec!["a".into(), "z".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 10);
    buf.replace(1, "A".into());

    assert_eq!(buf.as_slice(), ["A", "z"]);

    let undone = tree.undo(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(undone, 1);
    assert_eq!(buf.as_slice(), ["a", "z"]);
    assert!(tree.cur_head.is_some());

    let redone = tree.redo(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(redone, 1);
    assert_eq!(buf.as_slice(), ["A", "z"]);
    assert!(tree.cur_head.is_none());
}

#[test]
fn undo_past_oldest_header_is_a_no_op() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "A".into());

    assert_eq!(tree.undo(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap(), 1);
    assert_eq!(tree.undo(&mut buf, &mut extmarks, &mut cursor, &mut state, 5).unwrap(), 0);
    assert_eq!(buf.as_slice(), ["a"]);
}

#[test]
fn editing_after_undo_creates_a_branch() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    let h1 = tree.new_head.unwrap();

    tree.undo(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(buf.as_slice(), ["a"]);

    save_replace_line1(&mut tree, &buf, 2);
    buf.replace(1, "c".into());
    let h2 = tree.new_head.unwrap();

    assert_ne!(h1, h2);
    assert_eq!(tree.numhead, 2);
    assert!(tree.cur_head.is_none());
    assert_eq!(tree.header(h2).alt_next, Some(h1));
    assert_eq!(tree.header(h1).alt_prev, Some(h2));

    let list = tree.undo_list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].seq, 1);
    assert_eq!(list[1].seq, 2);

    let view = tree.undo_tree();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].seq, 2);
    assert_eq!(view.entries[0].alt.len(), 1);
    assert_eq!(view.entries[0].alt[0].seq, 1);
}

#[test]
fn time_step_by_seq_navigates_absolutely() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    save_replace_line1(&mut tree, &buf, 2);
    buf.replace(1, "c".into());
    save_replace_line1(&mut tree, &buf, 3);
    buf.replace(1, "d".into());

    assert_eq!(tree.seq_cur, 3);

    tree.time_step(
        &mut buf,
        &mut extmarks,
        &mut cursor,
        &mut state,
        TimeUnit::Seq,
        TimeMode::Absolute,
        1,
    )
    .unwrap();
    assert_eq!(tree.seq_cur, 1);
    assert_eq!(buf.as_slice(), ["b"]);

    tree.time_step(
        &mut buf,
        &mut extmarks,
        &mut cursor,
        &mut state,
        TimeUnit::Seq,
        TimeMode::Relative,
        2,
    )
    .unwrap();
    assert_eq!(tree.seq_cur, 3);
    assert_eq!(buf.as_slice(), ["d"]);
}

/// Reproduces a branch creation (same shape as
/// `editing_after_undo_creates_a_branch`) and then time-travels onto the
/// sibling branch — something a spine-only walk can never reach, since
/// `h1` hangs off `h2` via `alt_next`, not `next`.
#[test]
fn time_step_reaches_a_sibling_branch() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    let h1 = tree.new_head.unwrap();

    tree.undo(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();

    save_replace_line1(&mut tree, &buf, 2);
    buf.replace(1, "c".into());
    let h2 = tree.new_head.unwrap();
    assert_eq!(tree.header(h2).alt_next, Some(h1));

    // Currently on h2's branch (content "c"). Time-travel to seq 1, which
    // only exists on h1's sibling branch.
    let moved = tree
        .time_step(&mut buf, &mut extmarks, &mut cursor, &mut state, TimeUnit::Seq, TimeMode::Absolute, 1)
        .unwrap();
    assert!(moved > 0);
    assert_eq!(tree.seq_cur, 1);
    assert_eq!(buf.as_slice(), ["b"]);
    assert_eq!(tree.new_head, Some(h1));

    // And back onto h2's branch.
    let moved = tree
        .time_step(&mut buf, &mut extmarks, &mut cursor, &mut state, TimeUnit::Seq, TimeMode::Absolute, 2)
        .unwrap();
    assert!(moved > 0);
    assert_eq!(tree.seq_cur, 2);
    assert_eq!(buf.as_slice(), ["c"]);
    assert_eq!(tree.new_head, Some(h2));
}

#[test]
fn undo_and_forget_discards_the_redo_branch() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    assert_eq!(tree.numhead, 1);

    tree.undo_and_forget(&mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();

    assert_eq!(buf.as_slice(), ["a"]);
    assert_eq!(tree.numhead, 0);
    assert!(tree.cur_head.is_none());
    assert!(tree.new_head.is_none());
}

#[test]
fn mark_saved_advances_file_save_counter() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);

    save_replace_line1(&mut tree, &buf, 1);
    tree.mark_saved();

    assert_eq!(tree.save_nr_last, 1);
    assert_eq!(tree.save_nr_cur, 1);
    assert_eq!(tree.header(tree.new_head.unwrap()).save_nr, 1);
}

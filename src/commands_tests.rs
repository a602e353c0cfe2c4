use super::*;
use crate::collab::{CancelFlag, NullExtmarkStore, Position, SimpleBufferState, SimpleCursor, VecLineStore, VisualRegion, NMARKS};
use crate::undo::HeaderFlags;

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
    .unwrap();
}

#[test]
fn undo_then_redo_via_commands() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());

    let outcome = undo(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(outcome, CommandOutcome::Moved { applied: 1 });
    assert_eq!(buf.as_slice(), ["a"]);

    let outcome = redo(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(outcome, CommandOutcome::Moved { applied: 1 });
    assert_eq!(buf.as_slice(), ["b"]);
}

#[test]
fn earlier_and_later_move_by_seq() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    save_replace_line1(&mut tree, &buf, 2);
    buf.replace(1, "c".into());

    earlier(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, TimeUnit::Seq, 1).unwrap();
    assert_eq!(buf.as_slice(), ["b"]);

    later(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, TimeUnit::Seq, 1).unwrap();
    assert_eq!(buf.as_slice(), ["c"]);
}

#[test]
fn undo_to_seq_jumps_directly_to_a_header() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::default();
    let mut state = SimpleBufferState::default();

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());
    save_replace_line1(&mut tree, &buf, 2);
    buf.replace(1, "c".into());

    undo_to_seq(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, 1).unwrap();
    assert_eq!(buf.as_slice(), ["b"]);
}

#[test]
fn undolist_and_undotree_report_state() {
    let mut buf = VecLineStore::new(vec!["a".into()]);
    let mut tree = UndoTree::new(100);

    save_replace_line1(&mut tree, &buf, 1);
    buf.replace(1, "b".into());

    match undolist(&tree) {
        CommandOutcome::List(entries) => assert_eq!(entries.len(), 1),
        _ => panic!("expected List"),
    }
    match undotree(&tree) {
        CommandOutcome::Tree(view) => assert_eq!(view.seq_last, 1),
        _ => panic!("expected Tree"),
    }
}

#[test]
fn undojoin_requires_existing_history() {
    let mut tree = UndoTree::new(100);
    assert!(undojoin(&mut tree).is_err());

    let buf = VecLineStore::new(vec!["a".into()]);
    save_replace_line1(&mut tree, &buf, 1);
    assert!(undojoin(&mut tree).is_ok());
    assert!(!tree.synced);
}

#[test]
fn undo_file_path_is_a_dotfile_alongside_the_buffer() {
    let path = Path::new("/home/user/project/notes.txt");
    let undo_path = undo_file_path(path);
    assert_eq!(undo_path, Path::new("/home/user/project/.notes.txt.un~"));
}

//! vundo - a tiny demo driving the undo engine against an in-memory buffer.
//!
//! A real host wires `undo::UndoTree` up to its own buffer, cursor, and
//! extmark storage by implementing the traits in `collab`; this binary
//! exists to exercise the engine end-to-end without one.

use vundo::collab::{
    CancelFlag, NullExtmarkStore, Position, SimpleBufferState, SimpleCursor, VecLineStore, VisualRegion, NMARKS,
};
use vundo::commands;
use vundo::undo::{HeaderFlags, UndoTree};

fn main() {
    let mut buf = VecLineStore::new(vec!["hello".to_string(), "world".to_string()]);
    let mut extmarks = NullExtmarkStore;
    let mut cursor = SimpleCursor::new(Position::new(1, 0));
    let mut state = SimpleBufferState::default();
    let mut tree = UndoTree::new(1000);
    let cancel = CancelFlag::new();

    println!("initial: {:?}", buf.as_slice());

    if let Err(e) = tree.save(
        &buf,
        0,
        2,
        2,
        false,
        cursor.get(),
        -1,
        HeaderFlags::empty(),
        [Position::default(); NMARKS],
        VisualRegion::default(),
        1,
        &cancel,
    ) {
        eprintln!("save failed: {e}");
        std::process::exit(1);
    }
    buf.replace(1, "HELLO".to_string());
    cursor.set(Position::new(1, 5));
    println!("after edit: {:?}", buf.as_slice());

    match commands::undo(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, 1) {
        Ok(outcome) => println!("undo: {outcome:?} -> {:?}", buf.as_slice()),
        Err(e) => {
            eprintln!("undo failed: {e}");
            std::process::exit(1);
        }
    }

    match commands::redo(&mut tree, &mut buf, &mut extmarks, &mut cursor, &mut state, 1) {
        Ok(outcome) => println!("redo: {outcome:?} -> {:?}", buf.as_slice()),
        Err(e) => {
            eprintln!("redo failed: {e}");
            std::process::exit(1);
        }
    }

    if let commands::CommandOutcome::List(entries) = commands::undolist(&tree) {
        println!("undolist: {entries:?}");
    }
}

use super::*;
use crate::collab::{Position, VecLineStore, VisualRegion, NMARKS};

fn marks() -> [Position; NMARKS] {
    [Position::default(); NMARKS]
}

#[allow(clippy::too_many_arguments)]
fn save(
    tree: &mut UndoTree,
    buf: &VecLineStore,
    top: Line,
    bot: Line,
    time: u64,
) -> SaveOutcome {
    tree.save(
        buf,
        top,
        bot,
        0,
        false,
        Position::default(),
        -1,
        HeaderFlags::empty(),
        marks(),
        VisualRegion::default(),
        time,
        &CancelFlag::new(),
    )
    .expect("save should succeed")
}

fn buf(lines: &[&str]) -> VecLineStore {
    VecLineStore::new(lines.iter().map(|s| s.to_string()).collect())
}

#[test]
fn save_on_synced_tree_creates_new_header() {
    let mut tree = UndoTree::new(100);
    let b = buf(&["a", "b", "c"]);

    let outcome = save(&mut tree, &b, 0, 2, 1);

    assert_eq!(outcome, SaveOutcome::NewHeader);
    assert_eq!(tree.numhead, 1);
    assert!(tree.new_head.is_some());
    assert_eq!(tree.header(tree.new_head.unwrap()).seq, 1);
    assert!(!tree.synced);
}

#[test]
fn save_on_unsynced_tree_appends_entry() {
    let mut tree = UndoTree::new(100);
    let b = buf(&["a", "b", "c", "d"]);

    save(&mut tree, &b, 0, 2, 1);
    let outcome = save(&mut tree, &b, 2, 4, 2);

    assert_eq!(outcome, SaveOutcome::Appended);
    assert_eq!(tree.numhead, 1);
    let head = tree.new_head.unwrap();
    assert_eq!(tree.header(head).entries.len(), 2);
}

#[test]
fn precondition_violation_is_rejected() {
    let mut tree = UndoTree::new(100);
    let b = buf(&["a", "b"]);
    let result = tree.save(
        &b,
        2,
        1,
        0,
        false,
        Position::default(),
        -1,
        HeaderFlags::empty(),
        marks(),
        VisualRegion::default(),
        1,
        &CancelFlag::new(),
    );
    assert!(result.is_err());
}

#[test]
fn negative_undolevels_disables_recording() {
    let mut tree = UndoTree::new(-1);
    let b = buf(&["a", "b"]);

    let outcome = save(&mut tree, &b, 0, 2, 1);

    assert_eq!(outcome, SaveOutcome::NoUndo);
    assert_eq!(tree.numhead, 0);
}

#[test]
fn repeated_single_char_edits_coalesce() {
    let mut tree = UndoTree::new(1000);
    let b = buf(&["x"]);

    save(&mut tree, &b, 0, 2, 1);
    for t in 2..20u64 {
        let outcome = save(&mut tree, &b, 0, 2, t);
        assert_eq!(outcome, SaveOutcome::Coalesced);
    }

    let head = tree.new_head.unwrap();
    assert_eq!(tree.header(head).entries.len(), 1);
    assert_eq!(tree.numhead, 1);
}

#[test]
fn trimming_bounds_header_count_to_undolevels() {
    let mut tree = UndoTree::new(2);
    let b = buf(&["a", "b", "c", "d", "e", "f"]);

    for t in 0..5u64 {
        tree.synced = true;
        save(&mut tree, &b, 0, 2, t);
    }

    assert!(tree.numhead <= 3);
    assert!(tree.reachable_headers().len() as u32 == tree.numhead);
}

#[test]
fn free_header_detaches_middle_of_spine() {
    let mut tree = UndoTree::new(1000);
    let b = buf(&["a", "b"]);

    tree.synced = true;
    save(&mut tree, &b, 0, 2, 1);
    let h1 = tree.new_head.unwrap();
    tree.synced = true;
    save(&mut tree, &b, 0, 2, 2);
    let h2 = tree.new_head.unwrap();
    tree.synced = true;
    save(&mut tree, &b, 0, 2, 3);
    let h3 = tree.new_head.unwrap();

    assert_eq!(tree.numhead, 3);

    let mut out = None;
    tree.free_header(h2, &mut out);

    assert_eq!(tree.numhead, 2);
    // `next` points toward older headers, `prev` toward newer ones
    // (derived from `create_new_header`'s linking order); h2 sat between
    // h1 (oldest) and h3 (newest) on the spine.
    assert_eq!(tree.header(h3).next, Some(h1));
    assert_eq!(tree.header(h1).prev, Some(h3));
}

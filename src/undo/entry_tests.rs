use super::*;

#[test]
fn new_for_save_with_explicit_newbot() {
    let e = UndoEntry::new_for_save(0, 2, 5, 10, 1);
    assert_eq!(e.bot, 5);
    assert!(!e.needs_getbot);
}

#[test]
fn new_for_save_past_end_of_buffer_is_sentinel() {
    let e = UndoEntry::new_for_save(0, 11, 0, 10, 1);
    assert_eq!(e.bot, 0);
    assert!(!e.needs_getbot);
}

#[test]
fn new_for_save_defers_bot() {
    let e = UndoEntry::new_for_save(0, 2, 0, 10, 1);
    assert_eq!(e.bot, 0);
    assert_eq!(e.lcount, 10);
    assert!(e.needs_getbot);
}

#[test]
fn resolved_bot_uses_sentinel() {
    let mut e = UndoEntry::new_for_save(0, 11, 0, 10, 1);
    e.bot = 0;
    assert_eq!(e.resolved_bot(10), 11);
}

#[test]
fn line_snapshot_estimated_size_grows_with_content() {
    let small = LineSnapshot(vec!["a".into()]);
    let big = LineSnapshot(vec!["a".repeat(100)]);
    assert!(big.estimated_size() > small.estimated_size());
}

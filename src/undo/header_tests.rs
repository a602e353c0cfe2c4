use super::*;
use crate::collab::Position;

#[test]
fn header_flags_bits_match_original_layout() {
    assert_eq!(HeaderFlags::CHANGED.bits(), 1);
    assert_eq!(HeaderFlags::EMPTYBUF.bits(), 2);
    assert_eq!(HeaderFlags::RELOAD.bits(), 4);
}

#[test]
fn new_header_has_no_links() {
    let h = UndoHeader::new(1, 100, Position::default(), -1, HeaderFlags::empty());
    assert!(h.prev.is_none());
    assert!(h.next.is_none());
    assert!(h.alt_prev.is_none());
    assert!(h.alt_next.is_none());
    assert!(h.entries.is_empty());
}

#[test]
fn getbot_entry_mut_finds_the_flagged_entry() {
    use crate::undo::entry::UndoEntry;

    let mut h = UndoHeader::new(1, 100, Position::default(), -1, HeaderFlags::empty());
    h.entries.push(UndoEntry::new_for_save(0, 2, 0, 10, 1));
    assert!(h.getbot_entry_mut().is_some());
}

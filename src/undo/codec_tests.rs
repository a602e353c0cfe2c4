//! Tests for the binary codec

use super::*;
use std::io::Cursor;

#[test]
fn roundtrip_integers() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf);
        w.write_u8(7).unwrap();
        w.write_u16(0x1234).unwrap();
        w.write_u32(0xdead_beef).unwrap();
        w.write_u64(0x0102_0304_0506_0708).unwrap();
    }

    let mut r = Reader::new(Cursor::new(buf));
    assert_eq!(r.read_u8().unwrap(), 7);
    assert_eq!(r.read_u16().unwrap(), 0x1234);
    assert_eq!(r.read_u32().unwrap(), 0xdead_beef);
    assert_eq!(r.read_u64().unwrap(), 0x0102_0304_0506_0708);
}

#[test]
fn big_endian_byte_order() {
    let mut buf = Vec::new();
    Writer::new(&mut buf).write_u32(1).unwrap();
    assert_eq!(buf, vec![0, 0, 0, 1]);
}

#[test]
fn roundtrip_string() {
    let mut buf = Vec::new();
    Writer::new(&mut buf).write_string("hello undo").unwrap();

    let mut r = Reader::new(Cursor::new(buf));
    assert_eq!(r.read_string().unwrap(), "hello undo");
}

#[test]
fn empty_string_roundtrip() {
    let mut buf = Vec::new();
    Writer::new(&mut buf).write_string("").unwrap();
    let mut r = Reader::new(Cursor::new(buf));
    assert_eq!(r.read_string().unwrap(), "");
}

#[test]
fn roundtrip_opt_fields() {
    let mut buf = Vec::new();
    Writer::new(&mut buf)
        .write_opt_fields(&[OptField {
            tag: 1,
            payload: vec![0, 0, 0, 42],
        }])
        .unwrap();

    let mut r = Reader::new(Cursor::new(buf));
    let fields = r.read_opt_fields().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].tag, 1);
    assert_eq!(fields[0].payload, vec![0, 0, 0, 42]);
}

#[test]
fn empty_opt_fields_is_just_terminator() {
    let mut buf = Vec::new();
    Writer::new(&mut buf).write_opt_fields(&[]).unwrap();
    assert_eq!(buf, vec![0]);

    let mut r = Reader::new(Cursor::new(buf));
    assert!(r.read_opt_fields().unwrap().is_empty());
}

#[test]
fn unknown_opt_field_tag_is_skipped_by_caller() {
    // The reader hands back (tag, payload) pairs; skipping unknown tags is
    // the caller's job (mirrors unserialize_uhp's `default: skip` arm).
    let mut buf = Vec::new();
    Writer::new(&mut buf)
        .write_opt_fields(&[OptField {
            tag: 99,
            payload: vec![1, 2, 3],
        }])
        .unwrap();
    let mut r = Reader::new(Cursor::new(buf));
    let fields = r.read_opt_fields().unwrap();
    assert_eq!(fields[0].tag, 99);
}

#[test]
fn truncated_read_is_corrupt_file_error() {
    let buf = vec![0u8, 1]; // only 2 bytes, asking for a u32
    let mut r = Reader::new(Cursor::new(buf));
    let err = r.read_u32().unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorType::CorruptFile);
}

#[test]
fn oversized_string_length_rejected() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(200u32 * 1024 * 1024).to_be_bytes());
    let mut r = Reader::new(Cursor::new(buf));
    assert!(r.read_string().is_err());
}

#[test]
fn try_read_u16_sees_clean_eof() {
    let mut r = Reader::new(Cursor::new(Vec::<u8>::new()));
    assert_eq!(r.try_read_u16().unwrap(), None);
}

#[test]
fn try_read_u16_reads_magic_value() {
    let mut buf = Vec::new();
    Writer::new(&mut buf).write_u16(0xe7aa).unwrap();
    let mut r = Reader::new(Cursor::new(buf));
    assert_eq!(r.try_read_u16().unwrap(), Some(0xe7aa));
}

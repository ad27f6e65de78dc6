// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write as _;
use tempfile::tempdir;

fn value(text: &str) -> Option<Vec<u8>> {
    Some(text.as_bytes().to_vec())
}

#[test]
fn append_assigns_sequential_offsets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stations/0.log");
    let mut writer = SegmentWriter::open(&path).unwrap();

    assert_eq!(writer.append(10, None, value("a")).unwrap(), 0);
    assert_eq!(writer.append(11, None, value("b")).unwrap(), 1);
    assert_eq!(writer.append(12, value("k"), None).unwrap(), 2);
    assert_eq!(writer.next_offset(), 3);

    let entries = read_all(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].key, value("k"));
    assert_eq!(entries[2].value, None);
}

#[test]
fn reopen_continues_after_last_offset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    {
        let mut writer = SegmentWriter::open(&path).unwrap();
        writer.append(1, None, value("a")).unwrap();
        writer.append(2, None, value("b")).unwrap();
    }

    let mut writer = SegmentWriter::open(&path).unwrap();
    assert_eq!(writer.next_offset(), 2);
    assert_eq!(writer.append(3, None, value("c")).unwrap(), 2);
    assert_eq!(end_offset(&path).unwrap(), 3);
}

#[test]
fn two_writers_on_one_file_never_reuse_offsets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    let mut first = SegmentWriter::open(&path).unwrap();
    let mut second = SegmentWriter::open(&path).unwrap();

    assert_eq!(first.append(1, None, value("a")).unwrap(), 0);
    assert_eq!(second.append(2, None, value("b")).unwrap(), 1);
    assert_eq!(first.append(3, None, value("c")).unwrap(), 2);

    let offsets: Vec<u64> = read_all(&path).unwrap().iter().map(|e| e.offset).collect();
    assert_eq!(offsets, vec![0, 1, 2]);
}

#[test]
fn open_truncates_partial_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    {
        let mut writer = SegmentWriter::open(&path).unwrap();
        writer.append(1, None, value("a")).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"offset\":1,\"times").unwrap();
    }

    let mut writer = SegmentWriter::open(&path).unwrap();
    assert_eq!(writer.next_offset(), 1);
    assert_eq!(writer.append(2, None, value("b")).unwrap(), 1);
    assert_eq!(read_all(&path).unwrap().len(), 2);
}

#[test]
fn open_truncates_corrupted_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    {
        let mut writer = SegmentWriter::open(&path).unwrap();
        writer.append(1, None, value("a")).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"offset\":1,\"timestamp\":2,\"checksum\":7}\n")
            .unwrap();
    }

    let writer = SegmentWriter::open(&path).unwrap();
    assert_eq!(writer.next_offset(), 1);
    assert_eq!(read_all(&path).unwrap().len(), 1);
}

#[test]
fn cursor_on_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let mut cursor = SegmentCursor::new(&dir.path().join("absent.log"), 0);
    assert!(cursor.next_entry().unwrap().is_none());
}

#[test]
fn cursor_starts_at_requested_offset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    let mut writer = SegmentWriter::open(&path).unwrap();
    for i in 0..5 {
        writer.append(i, None, value(&i.to_string())).unwrap();
    }

    let mut cursor = SegmentCursor::new(&path, 3);
    assert_eq!(cursor.next_entry().unwrap().map(|e| e.offset), Some(3));
    assert_eq!(cursor.next_entry().unwrap().map(|e| e.offset), Some(4));
    assert!(cursor.next_entry().unwrap().is_none());
    assert_eq!(cursor.next_offset(), 5);
}

#[test]
fn cursor_tails_new_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    let mut writer = SegmentWriter::open(&path).unwrap();
    writer.append(1, None, value("a")).unwrap();

    let mut cursor = SegmentCursor::new(&path, 0);
    assert!(cursor.next_entry().unwrap().is_some());
    assert!(cursor.next_entry().unwrap().is_none());

    writer.append(2, None, value("b")).unwrap();
    let entry = cursor.next_entry().unwrap().unwrap();
    assert_eq!(entry.offset, 1);
    assert_eq!(entry.value, value("b"));
}

#[test]
fn cursor_waits_for_partial_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    let mut writer = SegmentWriter::open(&path).unwrap();
    writer.append(1, None, value("a")).unwrap();

    let line = LogEntry::new(1, 2, None, value("b")).to_line().unwrap();
    let (head, tail) = line.split_at(line.len() / 2);

    let mut raw = OpenOptions::new().append(true).open(&path).unwrap();
    raw.write_all(head.as_bytes()).unwrap();

    let mut cursor = SegmentCursor::new(&path, 0);
    assert_eq!(cursor.next_entry().unwrap().map(|e| e.offset), Some(0));
    assert!(cursor.next_entry().unwrap().is_none());

    raw.write_all(tail.as_bytes()).unwrap();
    raw.write_all(b"\n").unwrap();
    assert_eq!(cursor.next_entry().unwrap().map(|e| e.offset), Some(1));
}

#[test]
fn cursor_reports_checksum_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");
    std::fs::write(&path, "{\"offset\":0,\"timestamp\":1,\"checksum\":5}\n").unwrap();

    let mut cursor = SegmentCursor::new(&path, 0);
    let err = cursor.next_entry().unwrap_err();
    assert!(matches!(err, StorageError::Corrupted { position: 0, .. }));
}

#[test]
fn end_offset_of_missing_file_is_zero() {
    let dir = tempdir().unwrap();
    assert_eq!(end_offset(&dir.path().join("none.log")).unwrap(), 0);
}

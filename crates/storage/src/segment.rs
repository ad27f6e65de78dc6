// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only segment files
//!
//! One file per topic partition, one checksummed JSON entry per line:
//!
//! ```text
//! SegmentWriter ──append + fsync──▶ 0.log ◀──tail── SegmentCursor
//! ```
//!
//! ## Durability Guarantees
//!
//! - Every append is followed by `fsync()` before the offset is returned
//! - Appends hold an exclusive file lock, so several writers (in one or
//!   more processes) never assign the same offset
//! - A truncated or corrupted tail left by a crash is cut off when the next
//!   writer opens the file
//! - Readers never consume a line until its trailing newline is on disk

use crate::entry::LogEntry;
use crate::StorageError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Outcome of scanning a segment for valid entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scan {
    last_offset: Option<u64>,
    /// Byte length of the valid prefix
    valid_len: u64,
}

/// Scan from `start` (a line boundary) to the last valid entry
fn scan_from(path: &Path, start: u64) -> Result<Scan, StorageError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut reader = BufReader::new(file);

    let mut position = start;
    let mut last_offset = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = match reader.read_until(b'\n', &mut buf) {
            Ok(n) => n,
            Err(_) => break, // Stop at read error
        };
        if n == 0 || buf.last() != Some(&b'\n') {
            break; // EOF or truncated write
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            break;
        };
        let line = line.trim();
        if !line.is_empty() {
            match LogEntry::from_line(line) {
                Ok(entry) if entry.verify() => last_offset = Some(entry.offset),
                _ => break, // Stop at checksum mismatch or parse error
            }
        }
        position += n as u64;
    }

    Ok(Scan {
        last_offset,
        valid_len: position,
    })
}

/// Offset the next appended entry will receive
pub fn end_offset(path: &Path) -> Result<u64, StorageError> {
    if !path.exists() {
        return Ok(0);
    }
    Ok(scan_from(path, 0)?.last_offset.map_or(0, |o| o + 1))
}

/// Read every valid entry in order
pub fn read_all(path: &Path) -> Result<Vec<LogEntry>, StorageError> {
    let mut cursor = SegmentCursor::new(path, 0);
    let mut entries = Vec::new();
    while let Some(entry) = cursor.next_entry()? {
        entries.push(entry);
    }
    Ok(entries)
}

/// Durable appender for one segment file
pub struct SegmentWriter {
    path: PathBuf,
    file: File,
    next_offset: u64,
    /// File length after our last append or scan
    known_len: u64,
}

impl SegmentWriter {
    /// Open or create a segment, truncating any invalid tail
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let mut writer = Self {
            path: path.to_path_buf(),
            file,
            next_offset: 0,
            known_len: 0,
        };

        writer.file.lock_exclusive()?;
        let caught_up = writer.catch_up();
        let unlocked = FileExt::unlock(&writer.file);
        caught_up?;
        unlocked?;

        Ok(writer)
    }

    /// Pick up entries appended by other writers and drop a bad tail
    fn catch_up(&mut self) -> Result<(), StorageError> {
        let len = self.file.metadata()?.len();
        if len == self.known_len {
            return Ok(());
        }

        let scan = scan_from(&self.path, self.known_len)?;
        if let Some(last) = scan.last_offset {
            self.next_offset = last + 1;
        }
        if scan.valid_len < len {
            tracing::warn!(
                path = %self.path.display(),
                valid_len = scan.valid_len,
                file_len = len,
                "truncating invalid segment tail"
            );
            self.file.set_len(scan.valid_len)?;
            self.file.sync_all()?;
        }
        self.known_len = scan.valid_len;
        Ok(())
    }

    /// Append a record and return its offset.
    ///
    /// The entry is durably persisted (fsync'd) before this returns.
    pub fn append(
        &mut self,
        timestamp: i64,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<u64, StorageError> {
        self.file.lock_exclusive()?;
        let appended = self.append_locked(timestamp, key, value);
        let unlocked = FileExt::unlock(&self.file);
        let offset = appended?;
        unlocked?;
        Ok(offset)
    }

    fn append_locked(
        &mut self,
        timestamp: i64,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<u64, StorageError> {
        self.catch_up()?;

        let offset = self.next_offset;
        let entry = LogEntry::new(offset, timestamp, key, value);
        let mut line = entry.to_line()?;
        line.push('\n');

        // One write call so a concurrent reader sees all of the line or none
        self.file.write_all(line.as_bytes())?;

        // Critical: sync to ensure durability before returning
        self.file.sync_all()?;

        self.next_offset += 1;
        self.known_len += line.len() as u64;
        Ok(offset)
    }

    /// Offset the next append will receive, as of the last append or open
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Tailing reader over one segment file.
///
/// Returns `None` when it has caught up with the writer; calling again
/// later picks up newly appended entries.
pub struct SegmentCursor {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    /// Byte position after the last consumed line
    position: u64,
    /// Entries below this offset are skipped
    next_offset: u64,
}

impl SegmentCursor {
    /// Cursor that yields entries with offset `>= next_offset`
    pub fn new(path: &Path, next_offset: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            reader: None,
            position: 0,
            next_offset,
        }
    }

    /// Offset of the next entry this cursor will return
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn next_entry(&mut self) -> Result<Option<LogEntry>, StorageError> {
        if self.reader.is_none() {
            if !self.path.exists() {
                return Ok(None);
            }
            let mut file = File::open(&self.path)?;
            file.seek(SeekFrom::Start(self.position))?;
            self.reader = Some(BufReader::new(file));
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            if buf.last() != Some(&b'\n') {
                // Writer is mid-append; retry from the line start next time
                reader.seek(SeekFrom::Start(self.position))?;
                return Ok(None);
            }

            let start = self.position;
            let corrupted = |reason: String| StorageError::Corrupted {
                path: self.path.clone(),
                position: start,
                reason,
            };

            let line = std::str::from_utf8(&buf).map_err(|e| corrupted(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                self.position += n as u64;
                continue;
            }

            let entry = LogEntry::from_line(line).map_err(|e| corrupted(e.to_string()))?;
            if !entry.verify() {
                return Err(corrupted("checksum mismatch".to_string()));
            }

            self.position += n as u64;
            if entry.offset < self.next_offset {
                continue;
            }
            self.next_offset = entry.offset + 1;
            return Ok(Some(entry));
        }
    }
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;

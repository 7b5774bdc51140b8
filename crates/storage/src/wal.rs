// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of [`GatewayEvent`] deltas, one JSON object per line.
//!
//! Recovery reopens at a `processed_seq` cursor (the sequence number up to
//! and including which a snapshot already accounts for) and replays only
//! what's newer. Corruption — a truncated write, binary garbage from a
//! crash mid-flush — is handled by treating the WAL as valid up to the
//! first line that fails to parse: everything before that line is kept,
//! everything from that line onward is rotated into a `.bak` file so a
//! later investigation can inspect it, and appends resume cleanly.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::GatewayEvent;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalEntry {
    pub seq: u64,
    pub event: GatewayEvent,
}

/// Flush once this many unflushed appends have accumulated.
const FLUSH_THRESHOLD: usize = 100;

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset `next_unprocessed` reads from next; advances past every
    /// line it consumes, valid or not, independent of `processed_seq`.
    read_offset: u64,
    unflushed: usize,
}

impl Wal {
    /// Opens (creating if absent) the WAL at `path`. `processed_seq` is the
    /// sequence number a prior snapshot already covers.
    ///
    /// Lines that fail to parse as JSON mark the end of the valid prefix:
    /// everything from that point onward is rotated into a `.bak` file
    /// (rotating older backups, keeping at most 3) and the WAL is rewritten
    /// with only the valid prefix.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if !path.exists() {
            File::create(path)?;
        }

        let (valid_entries, had_corruption) = read_valid_prefix(path)?;
        if had_corruption {
            let bak = rotate_bak_path(path);
            fs::rename(path, &bak)?;
            let mut rewritten = File::create(path)?;
            for entry in &valid_entries {
                writeln!(rewritten, "{}", serde_json::to_string(entry)?)?;
            }
            rewritten.flush()?;
        }

        let write_seq = valid_entries.last().map(|e: &WalEntry| e.seq).unwrap_or(0);
        let file = OpenOptions::new().read(true).append(true).open(path)?;

        Ok(Wal { path: path.to_path_buf(), file, write_seq, processed_seq, read_offset: 0, unflushed: 0 })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn append(&mut self, event: &GatewayEvent) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{line}")?;
        self.unflushed += 1;
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.unflushed = 0;
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.unflushed >= FLUSH_THRESHOLD
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Reads forward from the internal cursor, skipping lines already
    /// covered by `processed_seq`, and returns the next fresh entry.
    /// Stops (returns `Ok(None)`) at end-of-file or at the first line that
    /// fails to parse — a torn write at the tail after a crash — but always
    /// advances the cursor past whatever line it consumed, so a later
    /// append past the bad line is picked up by the next call.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        loop {
            let mut reader = File::open(&self.path)?;
            reader.seek(SeekFrom::Start(self.read_offset))?;
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.read_offset += bytes_read as u64;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.trim().is_empty() {
                continue;
            }
            return match serde_json::from_str::<WalEntry>(trimmed) {
                Ok(entry) if entry.seq <= self.processed_seq => continue,
                Ok(entry) => Ok(Some(entry)),
                Err(_) => Ok(None),
            };
        }
    }

    /// All valid entries with `seq > after`, stopping at the first
    /// unparseable line. Unlike `next_unprocessed`, this is a stateless
    /// full rescan used at recovery time and for admin queries.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _) = read_valid_prefix(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drops entries with `seq < keep_from` by rewriting the file, used
    /// after a snapshot checkpoint makes them redundant.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        let (entries, _) = read_valid_prefix(&self.path)?;
        let kept: Vec<_> = entries.into_iter().filter(|e| e.seq >= keep_from).collect();
        let mut rewritten = File::create(&self.path)?;
        for entry in &kept {
            writeln!(rewritten, "{}", serde_json::to_string(entry)?)?;
        }
        rewritten.flush()?;
        self.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        self.read_offset = 0;
        Ok(())
    }
}

/// Reads every syntactically valid `WalEntry` line from the start of the
/// file, stopping at the first line that fails to parse. Returns the valid
/// entries plus whether any unparsed (corrupt) content was encountered.
fn read_valid_prefix(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    let text = match std::str::from_utf8(&raw) {
        Ok(t) => t,
        Err(e) => {
            let valid_len = e.valid_up_to();
            return read_lines_stopping_at_corruption(&raw[..valid_len], true);
        }
    };
    read_lines_stopping_at_corruption(text.as_bytes(), false)
}

fn read_lines_stopping_at_corruption(bytes: &[u8], force_corrupt: bool) -> Result<(Vec<WalEntry>, bool), WalError> {
    let mut entries = Vec::new();
    let mut corrupted = force_corrupt;
    for line in bytes.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => {
                corrupted = true;
                break;
            }
        }
    }
    Ok((entries, corrupted))
}

const MAX_BAK_FILES: u32 = 3;

/// Picks the next `.bak`/`.bak.N` path, rotating older backups out (keeps
/// at most [`MAX_BAK_FILES`]).
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;

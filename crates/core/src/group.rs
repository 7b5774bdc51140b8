// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group: a named collection of tags sharing a polling interval (spec §3, §4.3).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::tag::{Tag, TagAttribute};
use crate::time::now_us;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("tag name conflict")]
    TagNameConflict,
    #[error("tag does not exist")]
    TagNotExist,
}

struct Inner {
    interval_ms: u32,
    tags: HashMap<String, Tag>,
    /// Microseconds since epoch; bumped on any structural change.
    change_timestamp: i64,
}

/// A named collection of tags belonging to one driver.
///
/// Mutex-guarded per spec §4.3: critical sections are short (copy-out on
/// read, bump-and-insert on write). The mutex is private; all access goes
/// through methods that take the lock only as long as needed.
pub struct Group {
    name: String,
    inner: Mutex<Inner>,
}

/// Materialized view handed to `change_test`'s callback: the two snapshot
/// arrays the scheduler needs to rebuild its poll plan (spec §4.3).
pub struct GroupSnapshot {
    pub change_timestamp: i64,
    pub static_tags: Vec<Tag>,
    pub other_tags: Vec<Tag>,
    pub interval_ms: u32,
}

impl Group {
    pub fn new(name: impl Into<String>, interval_ms: u32) -> Self {
        Group {
            name: name.into(),
            inner: Mutex::new(Inner {
                interval_ms,
                tags: HashMap::new(),
                change_timestamp: now_us(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval_ms(&self) -> u32 {
        self.inner.lock().interval_ms
    }

    pub fn change_timestamp(&self) -> i64 {
        self.inner.lock().change_timestamp
    }

    pub fn tag_count(&self) -> usize {
        self.inner.lock().tags.len()
    }

    /// Updates the interval, bumping the timestamp iff it actually changed.
    pub fn set_interval(&self, interval_ms: u32) {
        let mut inner = self.inner.lock();
        if inner.interval_ms != interval_ms {
            inner.interval_ms = interval_ms;
            inner.change_timestamp = now_us();
        }
    }

    pub fn add_tag(&self, tag: Tag) -> Result<(), GroupError> {
        let mut inner = self.inner.lock();
        if inner.tags.contains_key(&tag.name) {
            return Err(GroupError::TagNameConflict);
        }
        inner.tags.insert(tag.name.clone(), tag);
        inner.change_timestamp = now_us();
        Ok(())
    }

    pub fn update_tag(&self, tag: Tag) -> Result<(), GroupError> {
        let mut inner = self.inner.lock();
        if !inner.tags.contains_key(&tag.name) {
            return Err(GroupError::TagNotExist);
        }
        inner.tags.insert(tag.name.clone(), tag);
        inner.change_timestamp = now_us();
        Ok(())
    }

    pub fn del_tag(&self, name: &str) -> Result<(), GroupError> {
        let mut inner = self.inner.lock();
        if inner.tags.remove(name).is_none() {
            return Err(GroupError::TagNotExist);
        }
        inner.change_timestamp = now_us();
        Ok(())
    }

    pub fn find_tag(&self, name: &str) -> Option<Tag> {
        self.inner.lock().tags.get(name).cloned()
    }

    pub fn all_tags(&self) -> Vec<Tag> {
        self.inner.lock().tags.values().cloned().collect()
    }

    /// Splits the current tags into static and pollable ("other") arrays,
    /// without checking or advancing the change timestamp.
    pub fn split_tags(&self) -> (Vec<Tag>, Vec<Tag>) {
        let inner = self.inner.lock();
        split(&inner.tags)
    }

    /// The change-detection protocol (spec §4.3): if the group's current
    /// timestamp differs from `last_ts`, produce a fresh snapshot. Returns
    /// `None` when nothing changed, sparing the caller a rebuild.
    pub fn change_test(&self, last_ts: i64) -> Option<GroupSnapshot> {
        let inner = self.inner.lock();
        if inner.change_timestamp == last_ts {
            return None;
        }
        let (static_tags, other_tags) = split(&inner.tags);
        Some(GroupSnapshot {
            change_timestamp: inner.change_timestamp,
            static_tags,
            other_tags,
            interval_ms: inner.interval_ms,
        })
    }
}

fn split(tags: &HashMap<String, Tag>) -> (Vec<Tag>, Vec<Tag>) {
    let mut static_tags = Vec::new();
    let mut other_tags = Vec::new();
    for tag in tags.values() {
        if tag.attribute.contains(TagAttribute::STATIC) {
            static_tags.push(tag.clone());
        } else if tag.attribute.is_pollable() {
            other_tags.push(tag.clone());
        }
    }
    (static_tags, other_tags)
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;

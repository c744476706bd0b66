#![forbid(unsafe_code)]

//! Local mirror of one remotely-replicated table.
//!
//! # Design
//!
//! [`EntityMirror<T>`] is driven solely by the three notifications the remote
//! store delivers: insert, update, and delete. No other writer exists. Rows
//! are stored in a persistent ordered map ([`im::OrdMap`]) keyed by
//! [`TableRow::key`], which gives two properties for free:
//!
//! - at most one row per key, whatever order notifications arrive in;
//! - [`EntityMirror::snapshot`] is an O(1) structural-sharing copy, so a
//!   snapshot handed to the renderer can never alias the live store.
//!
//! # Stale and duplicate delivery
//!
//! | Notification             | Key state | Outcome                          |
//! |--------------------------|-----------|----------------------------------|
//! | insert                   | absent    | [`MirrorChange::Inserted`]       |
//! | insert                   | present   | [`MirrorChange::Replaced`]       |
//! | insert (identical row)   | present   | [`MirrorChange::Duplicate`]      |
//! | update                   | present   | [`MirrorChange::Updated`]        |
//! | update                   | absent    | [`MirrorChange::UpsertedFromUpdate`] |
//! | delete                   | present   | [`MirrorChange::Deleted`]        |
//! | delete                   | absent    | [`MirrorChange::Ignored`]        |
//!
//! None of these are errors. Effective changes bump [`EntityMirror::version`]
//! and raise the mirror's dirty bit on its attached [`Invalidator`]; no-ops
//! (`Duplicate`, `Ignored`) do neither.

use std::fmt;

use im::OrdMap;
use tracing::debug;

use crate::invalidation::{Dirty, Invalidator};

/// A row of a replicated table with a stable identity key.
pub trait TableRow: Clone + PartialEq + fmt::Debug {
    /// Identity key. Two rows with equal keys are the same entity.
    type Key: Ord + Clone + fmt::Debug;

    /// Remote table name, used in logs.
    const TABLE: &'static str;

    fn key(&self) -> Self::Key;
}

/// Outcome of applying one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorChange {
    /// New key added.
    Inserted,
    /// Insert for a present key with a different row; the new row won.
    Replaced,
    /// Insert or update that left the mirror unchanged.
    Duplicate,
    /// Old key removed and new row stored.
    Updated,
    /// Update whose old key was absent; applied as a plain insert.
    UpsertedFromUpdate,
    /// Key removed.
    Deleted,
    /// Delete for an absent key.
    Ignored,
}

impl MirrorChange {
    /// Whether the mirror contents changed.
    #[must_use]
    pub const fn is_effective(self) -> bool {
        !matches!(self, Self::Duplicate | Self::Ignored)
    }

    /// Whether the notification was stale, duplicated, or out of order.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(
            self,
            Self::Replaced | Self::Duplicate | Self::UpsertedFromUpdate | Self::Ignored
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Replaced => "replaced",
            Self::Duplicate => "duplicate",
            Self::Updated => "updated",
            Self::UpsertedFromUpdate => "upserted_from_update",
            Self::Deleted => "deleted",
            Self::Ignored => "ignored",
        }
    }
}

/// Local cache of one remote table.
pub struct EntityMirror<T: TableRow> {
    rows: OrdMap<T::Key, T>,
    version: u64,
    invalidation: Option<(Invalidator, Dirty)>,
}

impl<T: TableRow> Default for EntityMirror<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableRow> EntityMirror<T> {
    /// Create a detached mirror (no render invalidation).
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: OrdMap::new(),
            version: 0,
            invalidation: None,
        }
    }

    /// Create a mirror that raises `reason` on `invalidator` for every
    /// effective mutation.
    #[must_use]
    pub fn attached(invalidator: Invalidator, reason: Dirty) -> Self {
        Self {
            invalidation: Some((invalidator, reason)),
            ..Self::new()
        }
    }

    /// Insert notification. An existing row with the same key is replaced.
    pub fn on_insert(&mut self, row: T) -> MirrorChange {
        let change = match self.rows.insert(row.key(), row.clone()) {
            None => MirrorChange::Inserted,
            Some(prev) if prev == row => MirrorChange::Duplicate,
            Some(_) => MirrorChange::Replaced,
        };
        self.finish("insert", &row.key(), change)
    }

    /// Update notification: drop `old`'s key, store `new`.
    ///
    /// If `old`'s key is absent the update degrades to an insert of `new`.
    pub fn on_update(&mut self, old: T, new: T) -> MirrorChange {
        let old_key = old.key();
        let new_key = new.key();
        let change = match self.rows.remove(&old_key) {
            Some(prev) => {
                // A row already sitting at the new key is displaced: one row per key.
                self.rows.insert(new_key.clone(), new.clone());
                if old_key == new_key && prev == new {
                    MirrorChange::Duplicate
                } else {
                    MirrorChange::Updated
                }
            }
            None => match self.rows.insert(new_key.clone(), new.clone()) {
                Some(prev) if prev == new => MirrorChange::Duplicate,
                _ => MirrorChange::UpsertedFromUpdate,
            },
        };
        self.finish("update", &new_key, change)
    }

    /// Delete notification. Absent keys are a no-op.
    pub fn on_delete(&mut self, row: &T) -> MirrorChange {
        let key = row.key();
        let change = match self.rows.remove(&key) {
            Some(_) => MirrorChange::Deleted,
            None => MirrorChange::Ignored,
        };
        self.finish("delete", &key, change)
    }

    fn finish(&mut self, op: &'static str, key: &T::Key, change: MirrorChange) -> MirrorChange {
        if change.is_degraded() {
            debug!(
                table = T::TABLE,
                op,
                key = ?key,
                change = change.as_str(),
                "stale or duplicate notification absorbed"
            );
        }
        if change.is_effective() {
            self.version += 1;
            if let Some((invalidator, reason)) = &self.invalidation {
                invalidator.invalidate(*reason);
            }
        }
        change
    }

    /// Immutable view of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> MirrorSnapshot<T> {
        MirrorSnapshot {
            rows: self.rows.clone(),
            version: self.version,
        }
    }

    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.rows.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.rows.contains_key(key)
    }

    /// Rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.rows.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Increments by exactly 1 on each effective mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: TableRow> fmt::Debug for EntityMirror<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMirror")
            .field("table", &T::TABLE)
            .field("len", &self.rows.len())
            .field("version", &self.version)
            .field("attached", &self.invalidation.is_some())
            .finish()
    }
}

/// Frozen copy of a mirror at one version.
#[derive(Clone)]
pub struct MirrorSnapshot<T: TableRow> {
    rows: OrdMap<T::Key, T>,
    version: u64,
}

impl<T: TableRow> MirrorSnapshot<T> {
    /// Rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.rows.values()
    }

    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.rows.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mirror version this snapshot was taken at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: TableRow> fmt::Debug for MirrorSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorSnapshot")
            .field("table", &T::TABLE)
            .field("len", &self.rows.len())
            .field("version", &self.version)
            .finish()
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry: pattern -> ordered handlers

use crate::error::BusError;
use crate::handler::{EventHandler, Payload};
use evt_core::{Topic, TopicPattern};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Handle returned by `subscribe`; the only way to revoke a subscription
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pattern: String,
    sequence: u64,
}

impl SubscriptionHandle {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// One row of the inspectable subscription table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub pattern: String,
    pub sequence: u64,
    pub handler: String,
}

/// A handler resolved for delivery of one envelope
pub(crate) struct Matched<P: Payload> {
    pub pattern: String,
    pub sequence: u64,
    pub handler: Arc<dyn EventHandler<P>>,
}

struct Entry<P: Payload> {
    sequence: u64,
    handler: Arc<dyn EventHandler<P>>,
}

struct PatternEntry<P: Payload> {
    pattern: TopicPattern,
    entries: Vec<Entry<P>>,
}

struct Table<P: Payload> {
    patterns: BTreeMap<String, PatternEntry<P>>,
    next_sequence: u64,
    closed: bool,
}

/// Holds active subscriptions
///
/// Reads take a snapshot under the read lock and release it before any
/// handler runs, so a concurrent unsubscribe never disturbs a delivery
/// already in progress.
pub struct SubscriptionRegistry<P: Payload> {
    table: RwLock<Table<P>>,
}

impl<P: Payload> SubscriptionRegistry<P> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                patterns: BTreeMap::new(),
                next_sequence: 1,
                closed: false,
            }),
        }
    }

    /// Register a handler under a pattern, after every existing subscription
    pub fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler<P>>,
    ) -> Result<SubscriptionHandle, BusError> {
        let parsed = TopicPattern::parse(pattern)?;

        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        if table.closed {
            return Err(BusError::BusClosed);
        }
        let sequence = table.next_sequence;
        table.next_sequence += 1;

        table
            .patterns
            .entry(pattern.to_string())
            .or_insert_with(|| PatternEntry {
                pattern: parsed,
                entries: Vec::new(),
            })
            .entries
            .push(Entry { sequence, handler });

        Ok(SubscriptionHandle {
            pattern: pattern.to_string(),
            sequence,
        })
    }

    /// Remove exactly the subscription behind `handle`
    ///
    /// Returns false if it was already removed.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        let Some(slot) = table.patterns.get_mut(&handle.pattern) else {
            return false;
        };

        let before = slot.entries.len();
        slot.entries.retain(|e| e.sequence != handle.sequence);
        let removed = slot.entries.len() != before;

        if slot.entries.is_empty() {
            table.patterns.remove(&handle.pattern);
        }
        removed
    }

    /// Handlers whose pattern matches `topic`, in registration order
    pub(crate) fn snapshot_for(&self, topic: &Topic) -> Vec<Matched<P>> {
        let mut matched: Vec<Matched<P>> = {
            let table = self.table.read().unwrap_or_else(|e| e.into_inner());
            table
                .patterns
                .iter()
                .filter(|(_, slot)| slot.pattern.matches(topic))
                .flat_map(|(raw, slot)| {
                    slot.entries.iter().map(move |e| Matched {
                        pattern: raw.clone(),
                        sequence: e.sequence,
                        handler: Arc::clone(&e.handler),
                    })
                })
                .collect()
        };

        matched.sort_by_key(|m| m.sequence);
        matched
    }

    /// The full subscription table ordered by sequence
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<SubscriptionInfo> = table
            .patterns
            .iter()
            .flat_map(|(raw, slot)| {
                slot.entries.iter().map(move |e| SubscriptionInfo {
                    pattern: raw.clone(),
                    sequence: e.sequence,
                    handler: e.handler.name().to_string(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.sequence);
        rows
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .patterns
            .values()
            .map(|slot| slot.entries.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription and refuse new ones, returning how many
    /// were removed
    pub fn close(&self) -> usize {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        table.closed = true;
        let removed = table.patterns.values().map(|s| s.entries.len()).sum();
        table.patterns.clear();
        removed
    }
}

impl<P: Payload> Default for SubscriptionRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> fmt::Debug for SubscriptionRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

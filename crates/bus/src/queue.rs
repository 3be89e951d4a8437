// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO of envelopes awaiting delivery
//!
//! Producers push under a [`BackpressurePolicy`]; workers pop. `close`
//! stops admissions but lets workers drain what is queued, `halt` stops
//! dequeues and hands back whatever is left.

use crate::config::BackpressurePolicy;
use crate::handler::Payload;
use evt_core::Envelope;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Why a push was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushError {
    Full,
    Closed,
}

/// Result of an accepted push
pub(crate) enum Pushed<P> {
    Queued,
    /// Admitted after evicting the queue head
    Evicted(Arc<Envelope<P>>),
}

struct QueueState<P> {
    items: VecDeque<Arc<Envelope<P>>>,
    closed: bool,
    halted: bool,
}

pub(crate) struct EventQueue<P> {
    state: Mutex<QueueState<P>>,
    capacity: usize,
    /// Signalled when an item is pushed, or on close/halt
    available: Notify,
    /// Signalled when an item is popped, or on close
    space: Notify,
}

impl<P: Payload> EventQueue<P> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                halted: false,
            }),
            capacity,
            available: Notify::new(),
            space: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<P>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Admit an envelope, applying `policy` when the queue is full
    pub(crate) async fn push(
        &self,
        envelope: Arc<Envelope<P>>,
        policy: BackpressurePolicy,
        block_timeout: Duration,
    ) -> Result<Pushed<P>, PushError> {
        // Only Block waits; a timeout past the end of time waits unbounded
        let deadline = match policy {
            BackpressurePolicy::Block => Instant::now().checked_add(block_timeout),
            _ => None,
        };

        loop {
            // Registered before the check so a pop in between is not missed
            let space = self.space.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return Err(PushError::Closed);
                }

                if state.items.len() < self.capacity {
                    state.items.push_back(envelope);
                    let room_left = state.items.len() < self.capacity;
                    drop(state);
                    self.available.notify_one();
                    if room_left && policy == BackpressurePolicy::Block {
                        // Pass the wakeup on to the next blocked producer
                        self.space.notify_one();
                    }
                    return Ok(Pushed::Queued);
                }

                match policy {
                    BackpressurePolicy::Reject => return Err(PushError::Full),
                    BackpressurePolicy::DropOldest => {
                        let evicted = state.items.pop_front();
                        state.items.push_back(envelope);
                        drop(state);
                        self.available.notify_one();
                        return Ok(match evicted {
                            Some(old) => Pushed::Evicted(old),
                            None => Pushed::Queued,
                        });
                    }
                    BackpressurePolicy::Block => {}
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, space).await.is_err() {
                        return Err(PushError::Full);
                    }
                }
                None => space.await,
            }
        }
    }

    /// Next envelope in FIFO order, or `None` once closed and empty (or halted)
    pub(crate) async fn pop(&self) -> Option<Arc<Envelope<P>>> {
        loop {
            let available = self.available.notified();
            {
                let mut state = self.lock();
                if state.halted {
                    return None;
                }
                if let Some(envelope) = state.items.pop_front() {
                    let more = !state.items.is_empty();
                    drop(state);
                    self.space.notify_one();
                    if more {
                        self.available.notify_one();
                    }
                    return Some(envelope);
                }
                if state.closed {
                    return None;
                }
            }
            available.await;
        }
    }

    /// Stop admitting; queued items remain poppable
    pub(crate) fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
        self.space.notify_waiters();
    }

    /// Stop dequeuing and discard the remainder, returning how many were left
    pub(crate) fn halt(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            state.closed = true;
            state.halted = true;
            let n = state.items.len();
            state.items.clear();
            n
        };
        self.available.notify_waiters();
        self.space.notify_waiters();
        discarded
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

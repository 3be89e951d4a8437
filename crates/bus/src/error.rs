// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the bus runtime

use crate::config::ConfigError;
use evt_core::EventError;
use thiserror::Error;

/// Errors surfaced to callers of the bus
#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("event queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
    #[error("event bus is closed")]
    BusClosed,
    #[error("no tokio runtime available to run bus workers")]
    NoRuntime,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl BusError {
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::BusClosed)
    }
}

/// Why a handler invocation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerCause {
    #[error("{0}")]
    Failed(String),
    #[error("panicked: {0}")]
    Panicked(String),
    #[error("cancelled before completion")]
    Cancelled,
}

/// A single failed handler invocation
///
/// Reported to the error sink, never to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler {handler} (pattern {pattern}, sequence {sequence}) failed on {topic}: {cause}")]
pub struct HandlerError {
    pub pattern: String,
    pub sequence: u64,
    pub handler: String,
    pub topic: String,
    pub cause: HandlerCause,
}

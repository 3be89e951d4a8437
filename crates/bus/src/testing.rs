// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording collaborators for tests

use crate::error::HandlerError;
use crate::logging::{BusLogger, ErrorSink, LogContext, LogLevel};
use std::sync::{Arc, Mutex};

/// One captured log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Vec<(&'static str, String)>,
}

impl LogRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logger that keeps every call in memory
#[derive(Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Records whose message equals `message`
    pub fn with_message(&self, message: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.message == message)
            .collect()
    }
}

impl BusLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, context: LogContext<'_>) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(LogRecord {
                level,
                message: message.to_string(),
                context: context.to_vec(),
            });
    }
}

/// Error sink that keeps every reported failure
#[derive(Clone, Default)]
pub struct RecordingSink {
    errors: Arc<Mutex<Vec<HandlerError>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<HandlerError> {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, error: &HandlerError) {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(error.clone());
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging collaborator and handler error sink
//!
//! The dispatcher never formats or routes log output itself; it hands
//! `(level, message, context)` to a [`BusLogger`]. Handler failures go to
//! an [`ErrorSink`], which by default logs them.

use crate::error::HandlerError;
use serde::Deserialize;
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

/// Severity passed to the logging collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Structured key-value pairs attached to a log line
pub type LogContext<'a> = &'a [(&'static str, String)];

/// Injected logging capability
pub trait BusLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: LogContext<'_>);
}

/// Logger that forwards to `tracing`
///
/// Context pairs are recorded as individual fields on a span around the
/// event. Keys outside the bus's own vocabulary are rendered into a single
/// `context` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl BusLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: LogContext<'_>) {
        use tracing::field::Empty;

        // Error level so the span is enabled whenever the event is
        let span = tracing::error_span!(
            target: "evt_bus",
            "evt_bus",
            topic = Empty,
            pattern = Empty,
            sequence = Empty,
            handler = Empty,
            cause = Empty,
            capacity = Empty,
            dropped_topic = Empty,
            dropped_aggregate_id = Empty,
            worker = Empty,
            drained = Empty,
            undelivered = Empty,
            subscriptions_removed = Empty,
            published = Empty,
            delivered = Empty,
            dropped = Empty,
            handler_errors = Empty,
            context = Empty,
        );

        let mut extra = Vec::new();
        for (key, value) in context {
            if *key != "context" && span.field(*key).is_some() {
                span.record(*key, value.as_str());
            } else {
                extra.push((*key, value.clone()));
            }
        }
        if !extra.is_empty() {
            span.record("context", render_context(&extra).as_str());
        }

        let _entered = span.enter();
        match level {
            LogLevel::Debug => tracing::debug!(target: "evt_bus", "{message}"),
            LogLevel::Info => tracing::info!(target: "evt_bus", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "evt_bus", "{message}"),
            LogLevel::Error => tracing::error!(target: "evt_bus", "{message}"),
        }
    }
}

/// Render context as `key=value key=value`
pub fn render_context(context: LogContext<'_>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in context.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    out
}

/// Receives every failed handler invocation
///
/// Implementations must not publish back into the bus from `report`.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &HandlerError);
}

/// Default sink: logs the failure at error level
pub struct LoggingErrorSink {
    logger: Arc<dyn BusLogger>,
}

impl LoggingErrorSink {
    pub fn new(logger: Arc<dyn BusLogger>) -> Self {
        Self { logger }
    }
}

impl ErrorSink for LoggingErrorSink {
    fn report(&self, error: &HandlerError) {
        self.logger.log(
            LogLevel::Error,
            "event handler failed",
            &[
                ("topic", error.topic.clone()),
                ("pattern", error.pattern.clone()),
                ("sequence", error.sequence.to_string()),
                ("handler", error.handler.clone()),
                ("cause", error.cause.to_string()),
            ],
        );
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;

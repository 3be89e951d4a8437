// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: queues envelopes and delivers them to matching handlers
//!
//! Workers pop envelopes in FIFO order, resolve every matching subscription
//! across all patterns, and invoke handlers one at a time in registration
//! order. Each invocation runs in its own task so an `Err` or a panic is
//! caught at the call site and reported to the [`ErrorSink`] instead of
//! aborting delivery to the remaining handlers.

use crate::config::{BackpressurePolicy, BusConfig};
use crate::error::{BusError, HandlerCause, HandlerError};
use crate::handler::Payload;
use crate::logging::{BusLogger, ErrorSink, LogLevel};
use crate::metrics::{BusMetrics, MetricsSnapshot};
use crate::queue::{EventQueue, PushError, Pushed};
use crate::registry::{Matched, SubscriptionRegistry};
use evt_core::Envelope;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

pub struct Dispatcher<P: Payload> {
    queue: EventQueue<P>,
    registry: Arc<SubscriptionRegistry<P>>,
    metrics: BusMetrics,
    logger: Arc<dyn BusLogger>,
    sink: Arc<dyn ErrorSink>,
    policy: BackpressurePolicy,
    block_timeout: Duration,
}

impl<P: Payload> Dispatcher<P> {
    pub(crate) fn new(
        config: &BusConfig,
        registry: Arc<SubscriptionRegistry<P>>,
        logger: Arc<dyn BusLogger>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            queue: EventQueue::new(config.capacity),
            registry,
            metrics: BusMetrics::default(),
            logger,
            sink,
            policy: config.backpressure,
            block_timeout: config.block_timeout,
        }
    }

    /// Place an envelope on the queue under the configured backpressure policy
    pub async fn enqueue(&self, envelope: Arc<Envelope<P>>) -> Result<(), BusError> {
        let topic = envelope.topic().to_string();
        let capacity = self.queue.capacity();

        match self.queue.push(envelope, self.policy, self.block_timeout).await {
            Ok(Pushed::Queued) => {
                self.metrics.record_published();
                Ok(())
            }
            Ok(Pushed::Evicted(old)) => {
                self.metrics.record_published();
                self.metrics.record_dropped(1);
                self.logger.log(
                    LogLevel::Warn,
                    "queue full, dropped oldest envelope",
                    &[
                        ("dropped_topic", old.topic().to_string()),
                        ("dropped_aggregate_id", old.aggregate_id().to_string()),
                        ("topic", topic),
                        ("capacity", capacity.to_string()),
                    ],
                );
                Ok(())
            }
            Err(PushError::Full) => {
                let (level, message) = match self.policy {
                    BackpressurePolicy::Block => (LogLevel::Warn, "publish timed out waiting for queue space"),
                    _ => (LogLevel::Debug, "publish rejected, queue full"),
                };
                self.logger.log(
                    level,
                    message,
                    &[("topic", topic), ("capacity", capacity.to_string())],
                );
                Err(BusError::QueueFull { capacity })
            }
            Err(PushError::Closed) => Err(BusError::BusClosed),
        }
    }

    /// Drain the queue until it is closed and empty, or halted
    pub(crate) async fn run_worker(self: Arc<Self>, worker: usize) {
        self.logger
            .log(LogLevel::Debug, "worker started", &[("worker", worker.to_string())]);

        while let Some(envelope) = self.queue.pop().await {
            self.dispatch(envelope).await;
        }

        self.logger
            .log(LogLevel::Debug, "worker stopped", &[("worker", worker.to_string())]);
    }

    /// Deliver one envelope to every matching handler in sequence order
    pub(crate) async fn dispatch(&self, envelope: Arc<Envelope<P>>) {
        let matched = self.registry.snapshot_for(envelope.topic());
        if matched.is_empty() {
            self.logger.log(
                LogLevel::Debug,
                "no subscribers for topic",
                &[("topic", envelope.topic().to_string())],
            );
            return;
        }

        for subscription in matched {
            match invoke(&subscription, Arc::clone(&envelope)).await {
                Ok(()) => self.metrics.record_delivered(),
                Err(cause) => {
                    self.metrics.record_handler_error();
                    self.sink.report(&HandlerError {
                        pattern: subscription.pattern,
                        sequence: subscription.sequence,
                        handler: subscription.handler.name().to_string(),
                        topic: envelope.topic().to_string(),
                        cause,
                    });
                }
            }
        }
    }

    pub(crate) fn close(&self) {
        self.queue.close();
    }

    /// Discard whatever is still queued, counting it as dropped
    pub(crate) fn halt(&self) -> usize {
        let discarded = self.queue.halt();
        self.metrics.record_dropped(discarded as u64);
        discarded
    }

    pub(crate) fn logger(&self) -> &dyn BusLogger {
        self.logger.as_ref()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Run one handler in its own task, converting failure into a cause
async fn invoke<P: Payload>(
    subscription: &Matched<P>,
    envelope: Arc<Envelope<P>>,
) -> Result<(), HandlerCause> {
    let handler = Arc::clone(&subscription.handler);
    let outcome = tokio::spawn(async move { handler.handle(envelope).await }).await;

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HandlerCause::Failed(e.to_string())),
        Err(e) if e.is_panic() => Err(HandlerCause::Panicked(panic_message(e.into_panic()))),
        Err(_) => Err(HandlerCause::Cancelled),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus facade
//!
//! The only entry point producers and consumers use. Build one at startup,
//! register handlers explicitly, and hand clones of the bus to whatever
//! needs to publish:
//!
//! ```no_run
//! # async fn demo() -> Result<(), evt_bus::BusError> {
//! use evt_bus::{handler_fn, EventBus, HandlerResult};
//! use evt_core::Envelope;
//! use std::sync::Arc;
//!
//! let bus = EventBus::builder()
//!     .subscribe(
//!         "user.*",
//!         handler_fn("welcome-mail", |env: Arc<Envelope>| async move {
//!             println!("{} {}", env.topic(), env.aggregate_id());
//!             HandlerResult::Ok(())
//!         }),
//!     )
//!     .build()?;
//!
//! bus.publish(Envelope::new("user.created", "user-1", serde_json::json!({}))?)
//!     .await?;
//! bus.shutdown_default().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::BusConfig;
use crate::dispatcher::Dispatcher;
use crate::error::BusError;
use crate::handler::{EventHandler, Payload};
use crate::logging::{BusLogger, ErrorSink, LogLevel, LoggingErrorSink, TracingLogger};
use crate::metrics::MetricsSnapshot;
use crate::registry::{SubscriptionHandle, SubscriptionInfo, SubscriptionRegistry};
use async_trait::async_trait;
use evt_core::Envelope;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Publishing capability handed to producers
#[async_trait]
pub trait Publisher<P: Payload>: Send + Sync {
    async fn publish(&self, envelope: Envelope<P>) -> Result<(), BusError>;
}

/// Outcome of [`EventBus::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every worker finished within the drain timeout
    pub drained: bool,
    /// Envelopes still queued at the timeout and discarded
    pub undelivered: usize,
}

struct Inner<P: Payload> {
    config: BusConfig,
    registry: Arc<SubscriptionRegistry<P>>,
    dispatcher: Arc<Dispatcher<P>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

/// In-process domain event bus
///
/// Cloning is cheap and every clone shares the same queue, workers and
/// subscriptions.
pub struct EventBus<P: Payload = serde_json::Value> {
    inner: Arc<Inner<P>>,
}

impl<P: Payload> EventBus<P> {
    pub fn builder() -> EventBusBuilder<P> {
        EventBusBuilder::new()
    }

    /// Bus with the given config, default logger and error sink
    pub fn new(config: BusConfig) -> Result<Self, BusError> {
        Self::builder().config(config).build()
    }

    /// Enqueue an envelope for delivery
    ///
    /// Returns once the envelope is queued (or refused by backpressure);
    /// never waits for handlers to run.
    pub async fn publish(&self, envelope: Envelope<P>) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::BusClosed);
        }
        self.inner.dispatcher.enqueue(Arc::new(envelope)).await
    }

    pub fn subscribe<H: EventHandler<P>>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<SubscriptionHandle, BusError> {
        self.subscribe_arc(pattern, Arc::new(handler))
    }

    pub fn subscribe_arc(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler<P>>,
    ) -> Result<SubscriptionHandle, BusError> {
        if self.is_closed() {
            return Err(BusError::BusClosed);
        }
        self.inner.registry.subscribe(pattern, handler)
    }

    /// Revoke a subscription; false if it was already gone
    ///
    /// Envelopes enqueued after this returns never reach the handler. One
    /// already dequeued for delivery may still reach it.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.inner.registry.unsubscribe(handle)
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.inner.registry.subscriptions()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.dispatcher.metrics()
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Shut down using the configured drain timeout
    pub async fn shutdown_default(&self) -> Result<ShutdownReport, BusError> {
        self.shutdown(self.inner.config.drain_timeout).await
    }

    /// Stop accepting events, drain for up to `drain_timeout`, then stop
    ///
    /// In-flight handlers are never interrupted. Anything still queued at
    /// the deadline is discarded and counted as dropped.
    pub async fn shutdown(&self, drain_timeout: Duration) -> Result<ShutdownReport, BusError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(BusError::BusClosed);
        }

        let dispatcher = &self.inner.dispatcher;
        dispatcher.close();

        let workers = std::mem::take(
            &mut *self.inner.workers.lock().unwrap_or_else(|e| e.into_inner()),
        );
        let drained = tokio::time::timeout(drain_timeout, async move {
            for worker in workers {
                let _ = worker.await;
            }
        })
        .await
        .is_ok();

        let undelivered = if drained { 0 } else { dispatcher.halt() };
        let removed = self.inner.registry.close();

        let (level, message) = if undelivered > 0 {
            (LogLevel::Warn, "event bus stopped, undelivered envelopes discarded")
        } else {
            (LogLevel::Info, "event bus stopped")
        };
        let metrics = dispatcher.metrics();
        dispatcher.logger().log(
            level,
            message,
            &[
                ("drained", drained.to_string()),
                ("undelivered", undelivered.to_string()),
                ("subscriptions_removed", removed.to_string()),
                ("published", metrics.published.to_string()),
                ("delivered", metrics.delivered.to_string()),
                ("dropped", metrics.dropped.to_string()),
                ("handler_errors", metrics.handler_errors.to_string()),
            ],
        );

        Ok(ShutdownReport {
            drained,
            undelivered,
        })
    }
}

impl<P: Payload> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Payload> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.inner.config)
            .field("subscriptions", &self.inner.registry.len())
            .field("queued", &self.inner.dispatcher.queued())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl<P: Payload> Publisher<P> for EventBus<P> {
    async fn publish(&self, envelope: Envelope<P>) -> Result<(), BusError> {
        EventBus::publish(self, envelope).await
    }
}

/// Startup-time assembly of a bus and its subscription table
pub struct EventBusBuilder<P: Payload> {
    config: BusConfig,
    logger: Option<Arc<dyn BusLogger>>,
    error_sink: Option<Arc<dyn ErrorSink>>,
    subscriptions: Vec<(String, Arc<dyn EventHandler<P>>)>,
}

impl<P: Payload> EventBusBuilder<P> {
    pub fn new() -> Self {
        Self {
            config: BusConfig::default(),
            logger: None,
            error_sink: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: impl BusLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Replace the default log-and-count sink
    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.error_sink = Some(Arc::new(sink));
        self
    }

    /// Register a handler; order of calls fixes delivery order
    pub fn subscribe(mut self, pattern: &str, handler: impl EventHandler<P>) -> Self {
        self.subscriptions
            .push((pattern.to_string(), Arc::new(handler)));
        self
    }

    /// Validate, register subscriptions and start the workers
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<EventBus<P>, BusError> {
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;

        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn BusLogger>);
        let sink = self
            .error_sink
            .unwrap_or_else(|| {
                Arc::new(LoggingErrorSink::new(Arc::clone(&logger))) as Arc<dyn ErrorSink>
            });

        let registry = Arc::new(SubscriptionRegistry::new());
        for (pattern, handler) in self.subscriptions {
            registry.subscribe(&pattern, handler)?;
        }

        let dispatcher = Arc::new(Dispatcher::new(
            &self.config,
            Arc::clone(&registry),
            logger,
            sink,
        ));

        let workers = (0..self.config.workers)
            .map(|i| runtime.spawn(Arc::clone(&dispatcher).run_worker(i)))
            .collect();

        Ok(EventBus {
            inner: Arc::new(Inner {
                config: self.config,
                registry,
                dispatcher,
                workers: Mutex::new(workers),
                closed: AtomicBool::new(false),
            }),
        })
    }
}

impl<P: Payload> Default for EventBusBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evt-bus: asynchronous in-process delivery of domain events
//!
//! Producers publish [`Envelope`]s; the bus queues them and, on worker
//! tasks, invokes every handler whose [`TopicPattern`] matches the topic,
//! in subscription order. Handler failures are contained and reported.
//!
//! Key types:
//! - [`EventBus`] / [`EventBusBuilder`] - the facade and its startup wiring
//! - [`EventHandler`] - the consumer capability
//! - [`BusConfig`] - capacity, workers, backpressure and timeouts
//! - [`BusLogger`] / [`ErrorSink`] - injected observability

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logging;
pub mod metrics;
mod queue;
pub mod registry;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use bus::{EventBus, EventBusBuilder, Publisher, ShutdownReport};
pub use config::{BackpressurePolicy, BusConfig, ConfigError, DEFAULT_CAPACITY};
pub use dispatcher::Dispatcher;
pub use error::{BusError, HandlerCause, HandlerError};
pub use handler::{handler_fn, EventHandler, FnHandler, HandlerResult, Payload};
pub use logging::{BusLogger, ErrorSink, LogContext, LogLevel, LoggingErrorSink, TracingLogger};
pub use metrics::{BusMetrics, MetricsSnapshot};
pub use registry::{SubscriptionHandle, SubscriptionInfo, SubscriptionRegistry};
pub use telemetry::{init_tracing, LogFormat, LoggingConfig};

pub use evt_core::{Envelope, EventError, Metadata, Topic, TopicPattern};

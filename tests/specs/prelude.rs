//! Shared helpers for bus specs

#![allow(dead_code)]

pub use evt_bus::testing::{RecordingLogger, RecordingSink};
pub use evt_bus::{
    handler_fn, BackpressurePolicy, BusConfig, BusError, EventBus, HandlerResult, LogLevel,
};
pub use evt_core::{Envelope, Metadata, Topic, TopicPattern};
pub use serde_json::{json, Value};
pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;

/// Ordered log of `label:topic` deliveries shared across handlers
#[derive(Clone, Default)]
pub struct Deliveries(Arc<Mutex<Vec<String>>>);

impl Deliveries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that records each envelope under `label`
    pub fn handler(
        &self,
        label: &'static str,
    ) -> impl evt_bus::EventHandler<Value> {
        let log = Arc::clone(&self.0);
        handler_fn(label, move |env: Arc<Envelope<Value>>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{label}:{}", env.topic()));
                HandlerResult::Ok(())
            }
        })
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn for_label(&self, label: &str) -> Vec<String> {
        let prefix = format!("{label}:");
        self.all()
            .into_iter()
            .filter(|d| d.starts_with(&prefix))
            .collect()
    }
}

/// Bus wired to an in-memory logger and error sink
pub struct Harness {
    pub bus: EventBus,
    pub logger: RecordingLogger,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        let logger = RecordingLogger::new();
        let sink = RecordingSink::new();
        let bus = EventBus::builder()
            .config(config)
            .logger(logger.clone())
            .error_sink(sink.clone())
            .build()
            .unwrap();
        Self { bus, logger, sink }
    }

    pub async fn publish(&self, topic: &str) {
        self.bus.publish(envelope(topic)).await.unwrap();
    }

    /// Shut down, draining everything queued
    pub async fn drain(&self) {
        let report = self.bus.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(report.drained, "bus did not drain: {report:?}");
    }
}

pub fn envelope(topic: &str) -> Envelope<Value> {
    Envelope::new(topic, "agg-1", json!({})).unwrap()
}

pub fn topic(s: &str) -> Topic {
    Topic::parse(s).unwrap()
}

pub fn pattern(s: &str) -> TopicPattern {
    TopicPattern::parse(s).unwrap()
}

/// Handler that blocks each invocation until the test releases it
#[derive(Clone)]
pub struct Gate(Arc<tokio::sync::Semaphore>);

impl Gate {
    pub fn closed() -> Self {
        Self(Arc::new(tokio::sync::Semaphore::new(0)))
    }

    pub fn handler(&self, label: &'static str) -> impl evt_bus::EventHandler<Value> {
        let permits = Arc::clone(&self.0);
        handler_fn(label, move |_env: Arc<Envelope<Value>>| {
            let permits = Arc::clone(&permits);
            async move {
                permits.acquire().await?.forget();
                HandlerResult::Ok(())
            }
        })
    }

    /// Let `n` more invocations finish
    pub fn release(&self, n: usize) {
        self.0.add_permits(n);
    }
}

/// Give the worker a moment to pick up queued work
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

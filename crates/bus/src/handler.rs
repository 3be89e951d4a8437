// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handler capability

use async_trait::async_trait;
use evt_core::Envelope;
use std::future::Future;
use std::sync::Arc;

/// Bounds every payload type carried by the bus
pub trait Payload: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Payload for T {}

/// Outcome of one handler invocation
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A consumer of envelopes
///
/// Returning `Err` or panicking counts as a failure; either way the
/// failure is contained and sibling handlers still run.
#[async_trait]
pub trait EventHandler<P: Payload>: Send + Sync + 'static {
    async fn handle(&self, envelope: Arc<Envelope<P>>) -> HandlerResult;

    /// Name used in logs and the subscription table
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler backed by an async closure
pub struct FnHandler<F> {
    name: String,
    f: F,
}

/// Wrap an async closure as a named handler
pub fn handler_fn<F>(name: impl Into<String>, f: F) -> FnHandler<F> {
    FnHandler {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<P, F, Fut> EventHandler<P> for FnHandler<F>
where
    P: Payload,
    F: Fn(Arc<Envelope<P>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, envelope: Arc<Envelope<P>>) -> HandlerResult {
        (self.f)(envelope).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

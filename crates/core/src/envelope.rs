// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The domain event envelope
//!
//! An [`Envelope`] is one immutable occurrence: a topic, the id of the
//! aggregate it concerns, an opaque payload and optional tracing metadata.
//! Fields are private so a published envelope can never be rewritten.

use crate::error::EventError;
use crate::topic::Topic;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Optional tracing metadata carried alongside an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_causation_id(mut self, causation_id: impl Into<String>) -> Self {
        self.causation_id = Some(causation_id.into());
        self
    }
}

/// A domain event ready to be published
///
/// `P` is the producer's payload type; the bus never looks inside it.
/// Serializes to the logging shape
/// `{topic, aggregateId, payload, occurredAt, metadata?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<P = serde_json::Value> {
    topic: Topic,
    aggregate_id: String,
    payload: P,
    occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl<P> Envelope<P> {
    /// Create an envelope stamped with the current time
    pub fn new(topic: &str, aggregate_id: impl Into<String>, payload: P) -> Result<Self, EventError> {
        let topic = Topic::parse(topic)?;
        let aggregate_id = aggregate_id.into();
        if aggregate_id.is_empty() {
            return Err(EventError::EmptyAggregateId);
        }

        Ok(Self {
            topic,
            aggregate_id,
            payload,
            occurred_at: Utc::now(),
            metadata: None,
        })
    }

    /// Attach metadata before publishing
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation errors for topics, patterns and envelopes

use thiserror::Error;

/// Errors raised while constructing event values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("invalid topic {topic:?}: {reason}")]
    InvalidTopic { topic: String, reason: String },
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("aggregate id must not be empty")]
    EmptyAggregateId,
}

impl EventError {
    pub(crate) fn topic(topic: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTopic {
            topic: topic.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors a producer sees when building an envelope
    /// (malformed topic or missing aggregate id)
    pub fn is_invalid_topic(&self) -> bool {
        matches!(self, Self::InvalidTopic { .. } | Self::EmptyAggregateId)
    }

    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }
}

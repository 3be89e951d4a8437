// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evt-core: value types for the in-process domain event bus
//!
//! This crate provides:
//! - `Topic` - validated dot-delimited event names
//! - `TopicPattern` - subscription patterns with `*` and trailing `**`
//! - `Envelope` - one immutable event occurrence with optional `Metadata`
//!
//! Nothing here touches a runtime; delivery lives in `evt-bus`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod error;
pub mod pattern;
pub mod topic;

pub use envelope::{Envelope, Metadata};
pub use error::EventError;
pub use pattern::TopicPattern;
pub use topic::Topic;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic pattern matching for subscriptions

use crate::error::EventError;
use crate::topic::{check_segment, Topic, SEPARATOR};
use std::fmt;

/// Pattern for matching topics
/// Supports:
///   - Exact: "user.created"
///   - Single wildcard: "user.*" matches "user.created", "user.deleted"
///   - Tail wildcard: "user.**" matches "user", "user.created", "user.profile.updated"
///
/// `**` is only legal as the final segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TopicPattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

impl TopicPattern {
    pub fn parse(pattern: &str) -> Result<Self, EventError> {
        if pattern.is_empty() {
            return Err(EventError::pattern(pattern, "pattern is empty"));
        }

        let parts: Vec<&str> = pattern.split(SEPARATOR).collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.into_iter().enumerate() {
            let segment = match part {
                "*" => Segment::One,
                "**" if i == last => Segment::Rest,
                "**" => {
                    return Err(EventError::pattern(
                        pattern,
                        "`**` is only allowed as the final segment",
                    ))
                }
                literal => {
                    check_segment(literal).map_err(|reason| EventError::pattern(pattern, reason))?;
                    Segment::Literal(literal.to_string())
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Check if this pattern matches a topic
    pub fn matches(&self, topic: &Topic) -> bool {
        let mut topic_parts = topic.segments();

        for segment in &self.segments {
            match segment {
                // ** matches everything remaining, including nothing
                Segment::Rest => return true,
                Segment::One => {
                    if topic_parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => match topic_parts.next() {
                    Some(part) if part == lit => {}
                    _ => return false,
                },
            }
        }

        topic_parts.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<&str> for TopicPattern {
    type Error = EventError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl std::str::FromStr for TopicPattern {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;

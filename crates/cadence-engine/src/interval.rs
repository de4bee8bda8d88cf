//! Time intervals with an opaque identity.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque identity of a calendar item, used for exclusion during conflict checks.
///
/// Occurrences of a recurring series share the series id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A half-open time range `[start, end)` owned by an identified calendar item.
///
/// Callers upstream guarantee `start < end`; [`Interval::try_new`] enforces it
/// for data arriving from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub id: EventId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, rejecting zero or negative durations.
    pub fn try_new(id: impl Into<EventId>, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self {
            id: id.into(),
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap: intervals that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

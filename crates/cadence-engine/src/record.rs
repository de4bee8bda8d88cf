//! Raw event records as supplied by the persistence layer.
//!
//! Records arrive as JSON with ISO 8601 timestamps and whole-minute buffers.
//! Converting a record validates it into a [`ScheduledEvent`]: a buffered
//! interval plus the parsed recurrence rule, if any.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::BufferedInterval;
use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::policy::EventType;
use crate::rule::{RecurrenceRule, RuleParser};

/// One stored event, as serialized by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub buffer_before_minutes: u32,
    #[serde(default)]
    pub buffer_after_minutes: u32,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub event_type: EventType,
    /// Compact recurrence descriptor; absent for single events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
}

/// A validated record: the first (or only) occurrence and its rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub item: BufferedInterval,
    pub recurrence: Option<RecurrenceRule>,
}

impl ScheduledEvent {
    pub fn single(item: BufferedInterval) -> Self {
        Self {
            item,
            recurrence: None,
        }
    }

    pub fn recurring(item: BufferedInterval, rule: RecurrenceRule) -> Self {
        Self {
            item,
            recurrence: Some(rule),
        }
    }
}

impl EventRecord {
    /// Validate timestamps and ordering, then parse the recurrence.
    ///
    /// A recurrence that fails to parse does not fail the record: the event is
    /// kept as a single occurrence and a warning is logged.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidDateTime` for unparseable timestamps and
    /// `EngineError::InvalidInterval` when `start >= end`.
    pub fn into_scheduled(self, parser: &RuleParser) -> Result<ScheduledEvent> {
        let start = parse_datetime(&self.start)?;
        let end = parse_datetime(&self.end)?;
        let interval = Interval::try_new(self.id, start, end)?;

        let item = BufferedInterval::new(interval)
            .with_buffers(
                Duration::minutes(i64::from(self.buffer_before_minutes)),
                Duration::minutes(i64::from(self.buffer_after_minutes)),
            )
            .protected(self.is_protected)
            .with_event_type(self.event_type);

        let recurrence = match self.recurrence.as_deref() {
            None => None,
            Some(text) => match parser.parse(text) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(
                        id = %item.id(),
                        rule = text,
                        error = %e,
                        "unusable recurrence, treating event as a single occurrence"
                    );
                    None
                }
            },
        };

        Ok(ScheduledEvent { item, recurrence })
    }
}

/// Parse a JSON array of records and validate each one.
pub fn scheduled_from_json(json: &str, parser: &RuleParser) -> Result<Vec<ScheduledEvent>> {
    let records: Vec<EventRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .map(|record| record.into_scheduled(parser))
        .collect()
}

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with offset, e.g. "2026-02-17T14:00:00+01:00"), naive
/// local time (e.g. "2026-02-17T14:00:00") and bare dates (midnight), the last
/// two interpreted as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| EngineError::InvalidDateTime(format!("'{}': {}", s, e)))
}

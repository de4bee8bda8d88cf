//! Recurrence rule parsing -- the compact `KEY=VALUE;KEY=VALUE` descriptor.
//!
//! The grammar is the one persisted alongside stored events:
//!
//! ```text
//! FREQ=WEEKLY;INTERVAL=2;COUNT=10
//! ```
//!
//! `FREQ` is mandatory and must name a supported frequency. `COUNT` and
//! `INTERVAL` are lenient: a missing, non-numeric or non-positive value falls
//! back to the configured default instead of failing. Callers that need strict
//! numeric validation must check the text themselves before parsing. `UNTIL` is
//! an optional exclusive bound on occurrence start; a malformed `UNTIL` is
//! ignored the same way. Any other key is ignored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// How far apart consecutive occurrences are, before applying the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(EngineError::UnsupportedFrequency(other.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated recurrence rule. Immutable once built.
///
/// Invariants: `interval >= 1` and `count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// A rule with the given frequency and the default interval and count.
    pub fn new(frequency: Frequency) -> Self {
        let config = EngineConfig::default();
        Self {
            frequency,
            interval: config.default_interval,
            count: config.default_count,
            until: None,
        }
    }

    /// Set the step multiplier. Zero is raised to 1.
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Set the series length. Zero is raised to 1.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }
}

/// Renders the rule back into the persisted grammar, with every field explicit.
impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FREQ={};INTERVAL={};COUNT={}",
            self.frequency, self.interval, self.count
        )?;
        match self.until {
            // The basic format has no fractional seconds.
            Some(until) if until.nanosecond() != 0 => {
                write!(f, ";UNTIL={}", until.to_rfc3339_opts(SecondsFormat::AutoSi, true))?
            }
            Some(until) => write!(f, ";UNTIL={}", until.format("%Y%m%dT%H%M%SZ"))?,
            None => {}
        }
        Ok(())
    }
}

impl FromStr for RecurrenceRule {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// Parser carrying the fallback values for lenient keys.
///
/// A zero default in the config is raised to 1, so parsed rules always keep
/// `interval >= 1` and `count >= 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser {
    config: EngineConfig,
}

impl RuleParser {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Parse a `KEY=VALUE;...` descriptor into a [`RecurrenceRule`].
    ///
    /// # Errors
    /// Returns `EngineError::MissingFrequency` when no `FREQ` key is present and
    /// `EngineError::UnsupportedFrequency` when its value is not one of
    /// DAILY, WEEKLY, MONTHLY or YEARLY. Such a rule must be treated as a single,
    /// non-recurring event by the caller.
    pub fn parse(&self, text: &str) -> Result<RecurrenceRule> {
        let mut freq = None;
        let mut count = None;
        let mut interval = None;
        let mut until = None;

        for segment in text.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once('=') else {
                tracing::debug!(segment, "skipping recurrence segment without '='");
                continue;
            };
            let value = value.trim();
            // Later occurrences of a key overwrite earlier ones.
            match key.trim() {
                "FREQ" => freq = Some(value),
                "COUNT" => count = Some(value),
                "INTERVAL" => interval = Some(value),
                "UNTIL" => until = Some(value),
                other => tracing::debug!(key = other, "ignoring unsupported recurrence key"),
            }
        }

        let frequency: Frequency = freq.ok_or(EngineError::MissingFrequency)?.parse()?;

        Ok(RecurrenceRule {
            frequency,
            interval: positive_or_default("INTERVAL", interval, self.config.default_interval),
            count: positive_or_default("COUNT", count, self.config.default_count),
            until: until.and_then(parse_until),
        })
    }
}

/// Parse with [`EngineConfig::default`] fallbacks (COUNT=52, INTERVAL=1).
pub fn parse(text: &str) -> Result<RecurrenceRule> {
    RuleParser::default().parse(text)
}

fn positive_or_default(key: &'static str, raw: Option<&str>, default: u32) -> u32 {
    let default = default.max(1);
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => value,
        _ => {
            tracing::debug!(key, value = raw, default, "invalid numeric value, using default");
            default
        }
    }
}

/// Accepts `YYYYMMDD`, `YYYYMMDDTHHMMSS` (optionally `Z`-suffixed) or RFC 3339.
/// Date-only and floating values are read as UTC.
fn parse_until(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        Some(dt.with_timezone(&Utc))
    } else if let Ok(ndt) = NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y%m%dT%H%M%S") {
        Some(ndt.and_utc())
    } else {
        NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    };

    if parsed.is_none() {
        tracing::debug!(value = raw, "ignoring malformed UNTIL");
    }
    parsed
}

//! Occurrence expansion -- turns a rule and its anchor into concrete intervals.
//!
//! Expansion is a pure function of (rule, anchor, window): the series holds no
//! cursor between calls, and each call builds a fresh lazy iterator.
//!
//! Occurrence `n` starts at `anchor.start + n * step`, where the step is
//! `interval` days, weeks, calendar months or calendar years. Month and year
//! steps use chrono's calendar arithmetic, which clamps to the last day of
//! shorter months. Every occurrence keeps the anchor's exact duration, so a
//! DST transition in the host's local time is not compensated for.

use chrono::{DateTime, Duration, Months, Utc};

use crate::config::DEFAULT_SERIES_CAP;
use crate::interval::Interval;
use crate::rule::{Frequency, RecurrenceRule};

/// A recurrence rule bound to its first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceSeries {
    rule: RecurrenceRule,
    anchor: Interval,
    cap: u32,
}

impl OccurrenceSeries {
    pub fn new(rule: RecurrenceRule, anchor: Interval) -> Self {
        Self {
            rule,
            anchor,
            cap: DEFAULT_SERIES_CAP,
        }
    }

    /// Override the structural cap on series length. Zero is raised to 1.
    pub fn with_cap(mut self, cap: u32) -> Self {
        self.cap = cap.max(1);
        self
    }

    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    pub fn anchor(&self) -> &Interval {
        &self.anchor
    }

    /// Maximum number of steps the series may take: `min(count, cap)`.
    pub fn limit(&self) -> u32 {
        self.rule.count().min(self.cap)
    }

    /// Lazily yield the occurrences whose start lies in `[range_start, range_end]`.
    ///
    /// Occurrences before `range_start` still consume the COUNT budget, so a
    /// narrow window can return fewer than `count` results, never more. An
    /// inverted window (`range_end < range_start`) yields nothing.
    pub fn occurrences(&self, range_start: DateTime<Utc>, range_end: DateTime<Utc>) -> Occurrences<'_> {
        Occurrences {
            series: self,
            range_start,
            range_end,
            duration: self.anchor.duration(),
            step: 0,
            limit: self.limit(),
            done: range_end < range_start,
        }
    }
}

/// Iterator over the visible occurrences of an [`OccurrenceSeries`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    series: &'a OccurrenceSeries,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    duration: Duration,
    step: u32,
    limit: u32,
    done: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        while !self.done && self.step < self.limit {
            let Some(start) = nth_start(&self.series.rule, self.series.anchor.start, self.step) else {
                // Calendar arithmetic overflowed; nothing later is representable.
                self.done = true;
                break;
            };
            if start > self.range_end || self.series.rule.until().is_some_and(|until| start >= until) {
                self.done = true;
                break;
            }
            // The step counts against COUNT whether or not it is visible.
            self.step += 1;

            if start >= self.range_start {
                let Some(end) = start.checked_add_signed(self.duration) else {
                    self.done = true;
                    break;
                };
                return Some(Interval {
                    id: self.series.anchor.id.clone(),
                    start,
                    end,
                });
            }
        }
        None
    }
}

/// Expand a rule anchored at `anchor` into the occurrences visible in the window.
///
/// Convenience wrapper over [`OccurrenceSeries::occurrences`] with the default
/// structural cap.
pub fn generate(
    rule: &RecurrenceRule,
    anchor: &Interval,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<Interval> {
    OccurrenceSeries::new(rule.clone(), anchor.clone())
        .occurrences(range_start, range_end)
        .collect()
}

/// Start of occurrence `n`, or `None` if it is not representable.
fn nth_start(rule: &RecurrenceRule, anchor: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
    let steps = n.checked_mul(rule.interval())?;
    match rule.frequency() {
        Frequency::Daily => anchor.checked_add_signed(Duration::try_days(i64::from(steps))?),
        Frequency::Weekly => anchor.checked_add_signed(Duration::try_weeks(i64::from(steps))?),
        Frequency::Monthly => anchor.checked_add_months(Months::new(steps)),
        Frequency::Yearly => anchor.checked_add_months(Months::new(steps.checked_mul(12)?)),
    }
}

//! The scheduling pipeline: materialize, look up conflicts, apply policy.
//!
//! A create/move request materializes the stored events visible around the
//! candidate, finds every buffered conflict, and evaluates the protection
//! policy for each one. The engine performs no locking: a check followed by a
//! write is only race-free if the persistence layer re-runs the check inside
//! the same transaction (or enforces an overlap constraint at commit).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DEFAULT_SERIES_CAP;
use crate::conflict::{find_conflicts, BufferedInterval, BufferedIntervalIndex};
use crate::expander::OccurrenceSeries;
use crate::interval::{EventId, Interval};
use crate::policy::{self, Decision, EventType};
use crate::record::ScheduledEvent;

/// One conflicting item and the policy decision about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictEntry {
    pub id: EventId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub effective_start: DateTime<Utc>,
    pub effective_end: DateTime<Utc>,
    pub event_type: EventType,
    pub is_protected: bool,
    /// Minutes the candidate overlaps the buffered interval.
    pub overlap_minutes: i64,
    pub decision: Decision,
}

/// Every conflict found for one candidate interval, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<ConflictEntry>,
}

impl ConflictReport {
    fn evaluate(candidate: &Interval, hits: &[&BufferedInterval], actor_can_override: bool) -> Self {
        let conflicts = hits
            .iter()
            .map(|item| ConflictEntry {
                id: item.id().clone(),
                start: item.interval.start,
                end: item.interval.end,
                effective_start: item.effective_start(),
                effective_end: item.effective_end(),
                event_type: item.event_type,
                is_protected: item.is_protected,
                overlap_minutes: item.overlap_minutes(candidate),
                decision: policy::evaluate(item, actor_can_override),
            })
            .collect();
        Self { conflicts }
    }

    /// No conflicts at all.
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Every conflict (if any) is allowed by policy.
    pub fn is_allowed(&self) -> bool {
        self.conflicts.iter().all(|c| c.decision.allowed)
    }

    /// Conflicts the policy refuses.
    pub fn denied(&self) -> impl Iterator<Item = &ConflictEntry> {
        self.conflicts.iter().filter(|c| !c.decision.allowed)
    }
}

/// Check a single candidate interval against existing items.
///
/// `exclude` names the event being edited, if any.
pub fn check_candidate(
    candidate: &Interval,
    exclude: Option<&EventId>,
    existing: &[BufferedInterval],
    actor_can_override: bool,
) -> ConflictReport {
    let hits = find_conflicts(candidate, exclude, existing);
    let report = ConflictReport::evaluate(candidate, &hits, actor_can_override);
    tracing::debug!(
        candidate = %candidate.id,
        start = %candidate.start,
        end = %candidate.end,
        conflicts = report.conflicts.len(),
        allowed = report.is_allowed(),
        "checked candidate"
    );
    report
}

/// Conflicts found for one occurrence of a recurring candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceConflicts {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub report: ConflictReport,
}

/// Result of checking every visible occurrence of a recurring candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesReport {
    pub occurrences_checked: usize,
    /// Only the occurrences that conflict with something.
    pub conflicting: Vec<OccurrenceConflicts>,
}

impl SeriesReport {
    pub fn is_clear(&self) -> bool {
        self.conflicting.is_empty()
    }

    pub fn is_allowed(&self) -> bool {
        self.conflicting.iter().all(|o| o.report.is_allowed())
    }
}

/// Check each occurrence of `series` visible in the window against `existing`.
pub fn check_series(
    series: &OccurrenceSeries,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    exclude: Option<&EventId>,
    existing: &[BufferedInterval],
    actor_can_override: bool,
) -> SeriesReport {
    let index = BufferedIntervalIndex::new(existing);
    let mut report = SeriesReport::default();

    for occurrence in series.occurrences(range_start, range_end) {
        report.occurrences_checked += 1;
        let hits = index.find_conflicts(&occurrence, exclude);
        if hits.is_empty() {
            continue;
        }
        report.conflicting.push(OccurrenceConflicts {
            start: occurrence.start,
            end: occurrence.end,
            report: ConflictReport::evaluate(&occurrence, &hits, actor_can_override),
        });
    }

    tracing::debug!(
        series = %series.anchor().id,
        checked = report.occurrences_checked,
        conflicting = report.conflicting.len(),
        allowed = report.is_allowed(),
        "checked recurring candidate"
    );
    report
}

/// Expand stored events into the buffered intervals visible in the window.
///
/// An item is kept when its buffered interval reaches into
/// `[range_start, range_end]`, whether it is a single event or one occurrence
/// of a recurring event. Occurrences that start before the window but still
/// cover it are included; each occurrence inherits the series id, buffers and
/// protection metadata.
pub fn materialize(
    events: &[ScheduledEvent],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<BufferedInterval> {
    materialize_with_cap(events, range_start, range_end, DEFAULT_SERIES_CAP)
}

/// [`materialize`] with an explicit structural cap on each series.
pub fn materialize_with_cap(
    events: &[ScheduledEvent],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    series_cap: u32,
) -> Vec<BufferedInterval> {
    if range_end < range_start {
        return Vec::new();
    }

    let mut out = Vec::new();
    for event in events {
        match &event.recurrence {
            None => {
                if reaches_window(&event.item, range_start, range_end) {
                    out.push(event.item.clone());
                }
            }
            Some(rule) => {
                let item = &event.item;
                // An occurrence can reach the window only if it starts within
                // one buffered span before it, or within the leading buffer after it.
                let lookback = item.effective_end() - item.interval.start;
                let lookahead = item.interval.start - item.effective_start();
                let expand_from = range_start
                    .checked_sub_signed(lookback)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                let expand_to = range_end
                    .checked_add_signed(lookahead)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);

                let series = OccurrenceSeries::new(rule.clone(), item.interval.clone())
                    .with_cap(series_cap);
                out.extend(
                    series
                        .occurrences(expand_from, expand_to)
                        .map(|interval| BufferedInterval {
                            interval,
                            ..item.clone()
                        })
                        .filter(|occurrence| reaches_window(occurrence, range_start, range_end)),
                );
            }
        }
    }
    out
}

fn reaches_window(item: &BufferedInterval, range_start: DateTime<Utc>, range_end: DateTime<Utc>) -> bool {
    item.effective_start() <= range_end && item.effective_end() > range_start
}

//! Buffer-aware conflict detection.
//!
//! Each existing item may reserve time before and after itself (travel, prep,
//! cool-down). A candidate conflicts with an item when it overlaps the item's
//! *effective* interval `[start - buffer_before, end + buffer_after)`. Overlap is
//! half-open: a candidate that ends exactly where an effective interval begins,
//! or begins exactly where one ends, is not a conflict.

use chrono::{DateTime, Duration, Utc};

use crate::interval::{EventId, Interval};
use crate::policy::EventType;

/// An existing calendar item with its buffers and protection metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedInterval {
    pub interval: Interval,
    pub buffer_before: Duration,
    pub buffer_after: Duration,
    pub is_protected: bool,
    pub event_type: EventType,
}

impl BufferedInterval {
    /// An ordinary, unprotected item with no buffers.
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            buffer_before: Duration::zero(),
            buffer_after: Duration::zero(),
            is_protected: false,
            event_type: EventType::Ordinary,
        }
    }

    pub fn with_buffers(mut self, before: Duration, after: Duration) -> Self {
        self.buffer_before = before;
        self.buffer_after = after;
        self
    }

    pub fn protected(mut self, is_protected: bool) -> Self {
        self.is_protected = is_protected;
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn id(&self) -> &EventId {
        &self.interval.id
    }

    /// Start minus the leading buffer. Negative buffers count as zero.
    pub fn effective_start(&self) -> DateTime<Utc> {
        let before = self.buffer_before.max(Duration::zero());
        self.interval
            .start
            .checked_sub_signed(before)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// End plus the trailing buffer. Negative buffers count as zero.
    pub fn effective_end(&self) -> DateTime<Utc> {
        let after = self.buffer_after.max(Duration::zero());
        self.interval
            .end
            .checked_add_signed(after)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `candidate` overlaps this item's effective interval.
    pub fn conflicts_with(&self, candidate: &Interval) -> bool {
        candidate.overlaps(self.effective_start(), self.effective_end())
    }

    /// Minutes of overlap between `candidate` and the effective interval,
    /// rounded up so any real overlap reports at least one minute.
    pub fn overlap_minutes(&self, candidate: &Interval) -> i64 {
        let overlap_start = candidate.start.max(self.effective_start());
        let overlap_end = candidate.end.min(self.effective_end());
        if overlap_end <= overlap_start {
            return 0;
        }
        let overlap = overlap_end - overlap_start;
        let whole = overlap.num_minutes();
        if overlap > Duration::minutes(whole) {
            whole + 1
        } else {
            whole
        }
    }
}

/// Find every existing item whose effective interval overlaps `candidate`.
///
/// The item whose id equals `exclude` is skipped, so an event being edited does
/// not conflict with its own prior occupancy. Results keep input order.
pub fn find_conflicts<'a>(
    candidate: &Interval,
    exclude: Option<&EventId>,
    existing: &'a [BufferedInterval],
) -> Vec<&'a BufferedInterval> {
    existing
        .iter()
        .filter(|item| exclude != Some(item.id()))
        .filter(|item| item.conflicts_with(candidate))
        .collect()
}

/// Precomputed effective interval of one member.
#[derive(Debug, Clone, Copy)]
struct Entry {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    position: usize,
}

/// A sorted view over a set of buffered intervals for repeated lookups.
///
/// Building the index computes every effective interval once and sorts by
/// effective start. A query only scans members whose effective start lies in
/// `(candidate.start - longest_span, candidate.end)`, which is where every
/// possible conflict must start. Answers are identical to [`find_conflicts`],
/// including input ordering.
#[derive(Debug, Clone)]
pub struct BufferedIntervalIndex<'a> {
    members: &'a [BufferedInterval],
    entries: Vec<Entry>,
    longest_span: Duration,
}

impl<'a> BufferedIntervalIndex<'a> {
    pub fn new(members: &'a [BufferedInterval]) -> Self {
        let mut entries: Vec<Entry> = members
            .iter()
            .enumerate()
            .map(|(position, item)| Entry {
                start: item.effective_start(),
                end: item.effective_end(),
                position,
            })
            .collect();
        entries.sort_by_key(|e| (e.start, e.position));

        let longest_span = entries
            .iter()
            .map(|e| e.end - e.start)
            .max()
            .unwrap_or_else(Duration::zero);

        Self {
            members,
            entries,
            longest_span,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Same contract as [`find_conflicts`], answered from the sorted entries.
    pub fn find_conflicts(&self, candidate: &Interval, exclude: Option<&EventId>) -> Vec<&'a BufferedInterval> {
        let upper = self.entries.partition_point(|e| e.start < candidate.end);
        let lower = match candidate.start.checked_sub_signed(self.longest_span) {
            Some(earliest) => self.entries[..upper].partition_point(|e| e.start < earliest),
            None => 0,
        };

        let mut hits: Vec<usize> = self.entries[lower..upper]
            .iter()
            .filter(|e| e.end > candidate.start)
            .map(|e| e.position)
            .filter(|&position| exclude != Some(self.members[position].id()))
            .collect();
        hits.sort_unstable();

        let members = self.members;
        hits.into_iter().map(|position| &members[position]).collect()
    }
}

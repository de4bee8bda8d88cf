//! # cadence-engine
//!
//! Recurrence expansion and buffer-aware conflict detection for calendar
//! scheduling.
//!
//! Every calendar view, meeting scheduler and focus-mode check goes through the
//! same pipeline: expand the recurring events visible in a window, find the
//! existing items a candidate interval overlaps once their buffers are applied,
//! then ask the protection policy whether each conflict may be overridden.
//! All functions are pure and synchronous; the engine keeps no state between
//! calls and is safe to share across threads.
//!
//! ## Modules
//!
//! - [`rule`] -- `FREQ=...;INTERVAL=...;COUNT=...` text → [`RecurrenceRule`]
//! - [`expander`] -- rule + anchor + window → bounded, ordered occurrences
//! - [`conflict`] -- buffered intervals and conflict lookup
//! - [`policy`] -- protection policy for conflicting items
//! - [`schedule`] -- the combined pipeline and conflict reports
//! - [`record`] -- raw event records from the persistence layer
//! - [`config`] -- parser defaults and the structural series cap
//! - [`error`] -- Error types

pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod interval;
pub mod policy;
pub mod record;
pub mod rule;
pub mod schedule;

pub use config::EngineConfig;
pub use conflict::{find_conflicts, BufferedInterval, BufferedIntervalIndex};
pub use error::EngineError;
pub use expander::{generate, OccurrenceSeries};
pub use interval::{EventId, Interval};
pub use policy::{evaluate, Decision, EventType, PolicyReason};
pub use record::{EventRecord, ScheduledEvent};
pub use rule::{parse, Frequency, RecurrenceRule, RuleParser};
pub use schedule::{check_candidate, check_series, materialize, ConflictReport};

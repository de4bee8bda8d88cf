//! WASM bindings for cadence-engine.
//!
//! Exposes rule parsing, occurrence expansion, buffered conflict lookup and the
//! protection policy to the calendar front end via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings with RFC 3339 timestamps.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p cadence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/cadence_engine_wasm.wasm
//! ```

use cadence_engine::record::{parse_datetime, scheduled_from_json, EventRecord};
use cadence_engine::{materialize, BufferedInterval, EngineError, Interval, OccurrenceSeries, RuleParser};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OccurrenceDto {
    id: String,
    start: String,
    end: String,
}

impl From<&Interval> for OccurrenceDto {
    fn from(i: &Interval) -> Self {
        Self {
            id: i.id.to_string(),
            start: i.start.to_rfc3339(),
            end: i.end.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct ConflictDto {
    id: String,
    start: String,
    end: String,
    effective_start: String,
    effective_end: String,
}

impl From<&BufferedInterval> for ConflictDto {
    fn from(b: &BufferedInterval) -> Self {
        Self {
            id: b.id().to_string(),
            start: b.interval.start.to_rfc3339(),
            end: b.interval.end.to_rfc3339(),
            effective_start: b.effective_start().to_rfc3339(),
            effective_end: b.effective_end().to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_err(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_interval(id: &str, start: &str, end: &str) -> Result<Interval, JsValue> {
    let start = parse_datetime(start).map_err(js_err)?;
    let end = parse_datetime(end).map_err(js_err)?;
    Interval::try_new(id, start, end).map_err(js_err)
}

/// Convert a JSON array of event records into the buffered intervals that can
/// touch `candidate`. Recurring records are expanded, so an occurrence that
/// covers the candidate is checked even when the series started long before.
fn existing_around(json: &str, candidate: &Interval) -> Result<Vec<BufferedInterval>, JsValue> {
    let events = scheduled_from_json(json, &RuleParser::default()).map_err(js_err)?;
    Ok(materialize(&events, candidate.start, candidate.end))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Parse a `FREQ=...;INTERVAL=...;COUNT=...` rule.
///
/// Returns the rule as JSON (`frequency`, `interval`, `count`, optional `until`),
/// or throws when `FREQ` is missing or unsupported.
#[wasm_bindgen(js_name = "parseRule")]
pub fn parse_rule(rule: &str) -> Result<String, JsValue> {
    let rule = cadence_engine::parse(rule).map_err(js_err)?;
    to_json(&rule)
}

/// Expand a recurring event into the occurrences visible in a window.
///
/// Returns a JSON array of `{id, start, end}` objects.
///
/// # Arguments
/// - `rule` -- compact rule text (e.g. "FREQ=WEEKLY;COUNT=10")
/// - `anchor_start`, `anchor_end` -- the first occurrence
/// - `range_start`, `range_end` -- the visible window (inclusive on start times)
#[wasm_bindgen(js_name = "expandOccurrences")]
pub fn expand_occurrences(
    rule: &str,
    anchor_start: &str,
    anchor_end: &str,
    range_start: &str,
    range_end: &str,
) -> Result<String, JsValue> {
    let rule = cadence_engine::parse(rule).map_err(js_err)?;
    let anchor = parse_interval("anchor", anchor_start, anchor_end)?;
    let from = parse_datetime(range_start).map_err(js_err)?;
    let to = parse_datetime(range_end).map_err(js_err)?;

    let series = OccurrenceSeries::new(rule, anchor);
    let dtos: Vec<OccurrenceDto> = series.occurrences(from, to).map(|o| OccurrenceDto::from(&o)).collect();
    to_json(&dtos)
}

/// Find every existing item whose buffered interval overlaps the candidate.
///
/// `existing_json` is a JSON array of event records; recurring records are
/// expanded around the candidate. `exclude_id` skips the item being edited. Returns a JSON array of conflicts in input order.
#[wasm_bindgen(js_name = "findConflicts")]
pub fn find_conflicts(
    candidate_start: &str,
    candidate_end: &str,
    exclude_id: Option<String>,
    existing_json: &str,
) -> Result<String, JsValue> {
    let candidate = parse_interval("candidate", candidate_start, candidate_end)?;
    let existing = existing_around(existing_json, &candidate)?;
    let exclude = exclude_id.map(cadence_engine::EventId::from);

    let hits = cadence_engine::find_conflicts(&candidate, exclude.as_ref(), &existing);
    let dtos: Vec<ConflictDto> = hits.into_iter().map(ConflictDto::from).collect();
    to_json(&dtos)
}

/// Evaluate the protection policy for a single conflicting record.
///
/// Returns `{allowed, reason}` as JSON.
#[wasm_bindgen(js_name = "evaluatePolicy")]
pub fn evaluate_policy(conflict_json: &str, actor_can_override: bool) -> Result<String, JsValue> {
    let record: EventRecord = serde_json::from_str(conflict_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid event JSON: {}", e)))?;
    let item = record
        .into_scheduled(&RuleParser::default())
        .map_err(js_err)?
        .item;
    to_json(&cadence_engine::evaluate(&item, actor_can_override))
}

/// Run the full check for a candidate: conflicts plus a policy decision each.
///
/// Returns the conflict report as JSON, including `allowed` for the overall verdict.
#[wasm_bindgen(js_name = "checkCandidate")]
pub fn check_candidate(
    candidate_start: &str,
    candidate_end: &str,
    exclude_id: Option<String>,
    existing_json: &str,
    actor_can_override: bool,
) -> Result<String, JsValue> {
    let candidate = parse_interval("candidate", candidate_start, candidate_end)?;
    let existing = existing_around(existing_json, &candidate)?;
    let exclude = exclude_id.map(cadence_engine::EventId::from);

    let report = cadence_engine::check_candidate(&candidate, exclude.as_ref(), &existing, actor_can_override);

    #[derive(Serialize)]
    struct Verdict<'a> {
        allowed: bool,
        #[serde(flatten)]
        report: &'a cadence_engine::ConflictReport,
    }
    to_json(&Verdict {
        allowed: report.is_allowed(),
        report: &report,
    })
}

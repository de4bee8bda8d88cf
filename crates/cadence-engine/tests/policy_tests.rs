//! Tests for the protection policy.

use cadence_engine::conflict::BufferedInterval;
use cadence_engine::interval::Interval;
use cadence_engine::policy::{evaluate, Decision, EventType, PolicyReason};
use chrono::{TimeZone, Utc};

fn item(event_type: EventType, is_protected: bool) -> BufferedInterval {
    let interval = Interval::try_new(
        "item",
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap(),
    )
    .unwrap();
    BufferedInterval::new(interval)
        .with_event_type(event_type)
        .protected(is_protected)
}

#[test]
fn focus_block_without_override_is_denied() {
    let decision = evaluate(&item(EventType::FocusBlock, true), false);
    assert_eq!(
        decision,
        Decision {
            allowed: false,
            reason: PolicyReason::OverrideDenied
        }
    );
}

#[test]
fn focus_block_with_override_is_granted() {
    let decision = evaluate(&item(EventType::FocusBlock, true), true);
    assert_eq!(
        decision,
        Decision {
            allowed: true,
            reason: PolicyReason::OverrideGranted
        }
    );
}

#[test]
fn ordinary_unprotected_conflict_is_informational() {
    for can_override in [false, true] {
        let decision = evaluate(&item(EventType::Ordinary, false), can_override);
        assert!(decision.allowed);
        assert_eq!(decision.reason, PolicyReason::NotProtected);
    }
}

#[test]
fn protected_flag_alone_protects_ordinary_events() {
    let decision = evaluate(&item(EventType::Ordinary, true), false);
    assert_eq!(decision.reason, PolicyReason::OverrideDenied);
}

#[test]
fn protected_kinds_are_protected_without_the_flag() {
    for kind in [EventType::FocusBlock, EventType::PersonalTime, EventType::OutOfOffice] {
        assert!(kind.is_protected_kind());
        let decision = evaluate(&item(kind, false), false);
        assert!(!decision.allowed, "{:?} should be protected", kind);
        assert_eq!(decision.reason, PolicyReason::OverrideDenied);
    }
    assert!(!EventType::Ordinary.is_protected_kind());
}

#[test]
fn event_types_serialize_in_screaming_snake_case() {
    assert_eq!(
        serde_json::to_string(&EventType::FocusBlock).unwrap(),
        "\"FOCUS_BLOCK\""
    );
    let parsed: EventType = serde_json::from_str("\"OUT_OF_OFFICE\"").unwrap();
    assert_eq!(parsed, EventType::OutOfOffice);
}

#[test]
fn reasons_render_as_wire_names() {
    assert_eq!(PolicyReason::NotProtected.to_string(), "NOT_PROTECTED");
    assert_eq!(PolicyReason::OverrideGranted.to_string(), "OVERRIDE_GRANTED");
    assert_eq!(
        serde_json::to_string(&PolicyReason::OverrideDenied).unwrap(),
        "\"OVERRIDE_DENIED\""
    );
}

//! Tests for recurrence rule parsing.

use cadence_engine::config::EngineConfig;
use cadence_engine::rule::{parse, Frequency, RecurrenceRule, RuleParser};
use cadence_engine::EngineError;
use chrono::{TimeZone, Utc};

// ---------------------------------------------------------------------------
// Required FREQ
// ---------------------------------------------------------------------------

#[test]
fn parses_each_supported_frequency() {
    for (text, expected) in [
        ("FREQ=DAILY", Frequency::Daily),
        ("FREQ=WEEKLY", Frequency::Weekly),
        ("FREQ=MONTHLY", Frequency::Monthly),
        ("FREQ=YEARLY", Frequency::Yearly),
    ] {
        let rule = parse(text).expect("should parse");
        assert_eq!(rule.frequency(), expected, "{}", text);
    }
}

#[test]
fn missing_freq_is_an_error() {
    let err = parse("COUNT=5;INTERVAL=2").unwrap_err();
    assert!(matches!(err, EngineError::MissingFrequency));
}

#[test]
fn empty_text_is_missing_freq() {
    assert!(matches!(parse("").unwrap_err(), EngineError::MissingFrequency));
}

#[test]
fn unknown_freq_fails_fast_instead_of_partial_expansion() {
    // A rule with an unsupported frequency is rejected outright; the caller
    // treats the event as a single occurrence rather than expanding a partial series.
    let err = parse("FREQ=HOURLY;COUNT=3").unwrap_err();
    match err {
        EngineError::UnsupportedFrequency(value) => assert_eq!(value, "HOURLY"),
        other => panic!("expected UnsupportedFrequency, got {:?}", other),
    }
}

#[test]
fn freq_is_case_sensitive() {
    assert!(matches!(
        parse("FREQ=daily").unwrap_err(),
        EngineError::UnsupportedFrequency(_)
    ));
    // Lower-case keys are not recognized either, so FREQ is missing.
    assert!(matches!(
        parse("freq=DAILY").unwrap_err(),
        EngineError::MissingFrequency
    ));
}

// ---------------------------------------------------------------------------
// Lenient COUNT / INTERVAL
// ---------------------------------------------------------------------------

#[test]
fn defaults_apply_when_keys_absent() {
    let rule = parse("FREQ=WEEKLY").unwrap();
    assert_eq!(rule.count(), 52);
    assert_eq!(rule.interval(), 1);
    assert_eq!(rule.until(), None);
}

#[test]
fn explicit_values_are_used() {
    let rule = parse("FREQ=DAILY;INTERVAL=2;COUNT=5").unwrap();
    assert_eq!(rule.frequency(), Frequency::Daily);
    assert_eq!(rule.interval(), 2);
    assert_eq!(rule.count(), 5);
}

#[test]
fn key_order_does_not_matter() {
    let a = parse("COUNT=5;INTERVAL=2;FREQ=DAILY").unwrap();
    let b = parse("FREQ=DAILY;INTERVAL=2;COUNT=5").unwrap();
    assert_eq!(a, b);
}

#[test]
fn non_numeric_values_fall_back_to_defaults() {
    let rule = parse("FREQ=DAILY;COUNT=abc;INTERVAL=two").unwrap();
    assert_eq!(rule.count(), 52);
    assert_eq!(rule.interval(), 1);
}

#[test]
fn zero_and_negative_values_fall_back_to_defaults() {
    let rule = parse("FREQ=DAILY;COUNT=0;INTERVAL=-3").unwrap();
    assert_eq!(rule.count(), 52);
    assert_eq!(rule.interval(), 1);
}

#[test]
fn configured_defaults_replace_builtin_ones() {
    let parser = RuleParser::new(EngineConfig {
        default_count: 10,
        default_interval: 3,
        ..EngineConfig::default()
    });
    let rule = parser.parse("FREQ=MONTHLY;COUNT=nope").unwrap();
    assert_eq!(rule.count(), 10);
    assert_eq!(rule.interval(), 3);
}

#[test]
fn zero_configured_defaults_are_raised_to_one() {
    let parser = RuleParser::new(EngineConfig {
        default_count: 0,
        default_interval: 0,
        ..EngineConfig::default()
    });
    let rule = parser.parse("FREQ=DAILY").unwrap();
    assert_eq!(rule.count(), 1);
    assert_eq!(rule.interval(), 1);

    let rule = parser.parse("FREQ=DAILY;COUNT=0;INTERVAL=x").unwrap();
    assert_eq!(rule.count(), 1);
    assert_eq!(rule.interval(), 1);
}

// ---------------------------------------------------------------------------
// Tolerated noise
// ---------------------------------------------------------------------------

#[test]
fn whitespace_and_empty_segments_are_tolerated() {
    let rule = parse(" FREQ = DAILY ;; COUNT= 4 ;").unwrap();
    assert_eq!(rule.frequency(), Frequency::Daily);
    assert_eq!(rule.count(), 4);
}

#[test]
fn unsupported_keys_are_ignored() {
    let rule = parse("FREQ=WEEKLY;BYDAY=MO,WE;COUNT=6").unwrap();
    assert_eq!(rule.frequency(), Frequency::Weekly);
    assert_eq!(rule.count(), 6);
}

#[test]
fn segment_without_equals_is_skipped() {
    let rule = parse("FREQ=DAILY;GARBAGE;COUNT=2").unwrap();
    assert_eq!(rule.count(), 2);
}

#[test]
fn repeated_key_takes_last_value() {
    let rule = parse("FREQ=DAILY;COUNT=2;COUNT=7").unwrap();
    assert_eq!(rule.count(), 7);
}

// ---------------------------------------------------------------------------
// UNTIL
// ---------------------------------------------------------------------------

#[test]
fn until_accepts_date_only() {
    let rule = parse("FREQ=DAILY;UNTIL=20240115").unwrap();
    assert_eq!(
        rule.until(),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
}

#[test]
fn until_accepts_ical_datetime() {
    let rule = parse("FREQ=DAILY;UNTIL=20240115T093000Z").unwrap();
    assert_eq!(
        rule.until(),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap())
    );
}

#[test]
fn until_accepts_rfc3339() {
    let rule = parse("FREQ=DAILY;UNTIL=2024-01-15T10:00:00+01:00").unwrap();
    assert_eq!(
        rule.until(),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
    );
}

#[test]
fn malformed_until_is_ignored() {
    let rule = parse("FREQ=DAILY;UNTIL=next-tuesday").unwrap();
    assert_eq!(rule.until(), None);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn display_renders_persisted_grammar() {
    let rule = parse("COUNT=5;FREQ=DAILY;INTERVAL=2").unwrap();
    assert_eq!(rule.to_string(), "FREQ=DAILY;INTERVAL=2;COUNT=5");
}

#[test]
fn rendered_rule_parses_back_to_the_same_rule() {
    let rule = RecurrenceRule::new(Frequency::Yearly)
        .with_interval(2)
        .with_count(9)
        .with_until(Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap());
    let text = rule.to_string();
    assert_eq!(text, "FREQ=YEARLY;INTERVAL=2;COUNT=9;UNTIL=20300601T120000Z");
    assert_eq!(text.parse::<RecurrenceRule>().unwrap(), rule);
}

#[test]
fn fractional_until_survives_rendering() {
    let rule = parse("FREQ=DAILY;UNTIL=2024-01-05T00:00:00.500Z").unwrap();
    let text = rule.to_string();
    assert_eq!(text, "FREQ=DAILY;INTERVAL=1;COUNT=52;UNTIL=2024-01-05T00:00:00.500Z");
    assert_eq!(parse(&text).unwrap(), rule);
}

#[test]
fn builder_raises_zero_to_one() {
    let rule = RecurrenceRule::new(Frequency::Daily)
        .with_interval(0)
        .with_count(0);
    assert_eq!(rule.interval(), 1);
    assert_eq!(rule.count(), 1);
}

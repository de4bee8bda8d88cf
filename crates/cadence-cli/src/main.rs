//! `cadence` CLI -- parse recurrence rules, expand occurrences and check a
//! candidate slot against a calendar from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Show how a stored rule is interpreted
//! cadence parse --rule "FREQ=DAILY;INTERVAL=2"
//!
//! # List the occurrences visible in January
//! cadence expand --rule "FREQ=WEEKLY;COUNT=3" \
//!   --start 2024-01-01T09:00:00 --end 2024-01-01T10:00:00 \
//!   --from 2024-01-08 --to 2024-01-31
//!
//! # Check a candidate slot against an events file (exit status 1 if denied)
//! cadence check -i events.json --start 2024-01-02T10:00:00 --end 2024-01-02T11:00:00
//!
//! # Same, moving an existing event and holding override capability
//! cadence check -i events.json --start ... --end ... --exclude evt-42 --can-override
//!
//! # Override engine defaults
//! cadence --config cadence.toml expand ...
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`; stdout carries JSON only.

use anyhow::{Context, Result};
use cadence_engine::record::{parse_datetime, scheduled_from_json};
use cadence_engine::schedule::{check_series, materialize_with_cap};
use cadence_engine::{
    check_candidate, EngineConfig, EventId, Interval, OccurrenceSeries, RecurrenceRule, RuleParser,
};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "cadence",
    version,
    about = "Recurrence expansion and buffered conflict checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file overriding engine defaults (default_count, default_interval, series_cap)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a recurrence rule and print its interpretation as JSON
    Parse {
        /// Rule text, e.g. "FREQ=WEEKLY;INTERVAL=2;COUNT=10"
        #[arg(long)]
        rule: String,
    },
    /// Expand a recurring event into the occurrences visible in a window
    Expand {
        /// Rule text
        #[arg(long)]
        rule: String,
        /// Start of the first occurrence
        #[arg(long)]
        start: String,
        /// End of the first occurrence
        #[arg(long)]
        end: String,
        /// Window start (inclusive)
        #[arg(long)]
        from: String,
        /// Window end (inclusive)
        #[arg(long)]
        to: String,
    },
    /// Check a candidate slot against a JSON events file
    Check {
        /// Events file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Candidate start
        #[arg(long)]
        start: String,
        /// Candidate end
        #[arg(long)]
        end: String,
        /// Recurrence of the candidate; checks every occurrence in the window
        #[arg(long)]
        rule: Option<String>,
        /// Id of the event being moved, ignored during the check
        #[arg(long)]
        exclude: Option<String>,
        /// The actor may override protected time
        #[arg(long)]
        can_override: bool,
        /// Window start (defaults to one day before the candidate)
        #[arg(long)]
        from: Option<String>,
        /// Window end (defaults to one day after the candidate, or a year for a recurring one)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Serialize)]
struct OccurrenceOutput {
    id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize)]
struct RuleOutput<'a> {
    canonical: String,
    #[serde(flatten)]
    rule: &'a RecurrenceRule,
}

#[derive(Serialize)]
struct Verdict<T: Serialize> {
    allowed: bool,
    #[serde(flatten)]
    report: T,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let parser = RuleParser::new(config);

    match cli.command {
        Commands::Parse { rule } => {
            let parsed = parser.parse(&rule).context("Failed to parse rule")?;
            print_json(&RuleOutput {
                canonical: parsed.to_string(),
                rule: &parsed,
            })?;
        }
        Commands::Expand {
            rule,
            start,
            end,
            from,
            to,
        } => {
            let parsed = parser.parse(&rule).context("Failed to parse rule")?;
            let anchor = parse_interval("series", &start, &end)?;
            let from = parse_time(&from)?;
            let to = parse_time(&to)?;

            let series = OccurrenceSeries::new(parsed, anchor).with_cap(config.series_cap);
            let occurrences: Vec<OccurrenceOutput> = series
                .occurrences(from, to)
                .map(|o| OccurrenceOutput {
                    id: o.id.to_string(),
                    start: o.start,
                    end: o.end,
                })
                .collect();
            print_json(&occurrences)?;
        }
        Commands::Check {
            input,
            start,
            end,
            rule,
            exclude,
            can_override,
            from,
            to,
        } => {
            let json = read_input(input.as_deref())?;
            let events = scheduled_from_json(&json, &parser).context("Failed to load events")?;

            let candidate_id = exclude.clone().unwrap_or_else(|| "candidate".to_string());
            let candidate = parse_interval(&candidate_id, &start, &end)?;
            let exclude = exclude.map(EventId::from);
            let series = match rule.as_deref() {
                Some(text) => Some(
                    OccurrenceSeries::new(
                        parser.parse(text).context("Failed to parse candidate rule")?,
                        candidate.clone(),
                    )
                    .with_cap(config.series_cap),
                ),
                None => None,
            };

            let default_to = if series.is_some() {
                candidate.start + Duration::days(365)
            } else {
                candidate.end + Duration::days(1)
            };
            let from = match from {
                Some(s) => parse_time(&s)?,
                None => candidate.start - Duration::days(1),
            };
            let to = match to {
                Some(s) => parse_time(&s)?,
                None => default_to,
            };

            // Occurrences starting near `to` still run for the candidate's duration.
            let existing =
                materialize_with_cap(&events, from, to + candidate.duration(), config.series_cap);
            tracing::info!(
                events = events.len(),
                materialized = existing.len(),
                "loaded calendar"
            );

            let allowed = match series {
                Some(series) => {
                    let report = check_series(&series, from, to, exclude.as_ref(), &existing, can_override);
                    let allowed = report.is_allowed();
                    print_json(&Verdict { allowed, report })?;
                    allowed
                }
                None => {
                    let report = check_candidate(&candidate, exclude.as_ref(), &existing, can_override);
                    let allowed = report.is_allowed();
                    print_json(&Verdict { allowed, report })?;
                    allowed
                }
            };

            if !allowed {
                process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "cadence=debug,cadence_engine=debug"
    } else {
        "cadence=info,cadence_engine=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Load and validate the engine configuration; defaults when no file is given.
fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {}", path))?;
    let config: EngineConfig =
        toml::from_str(&text).with_context(|| format!("Failed to parse config: {}", path))?;
    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    parse_datetime(s).with_context(|| format!("Invalid time: {}", s))
}

fn parse_interval(id: &str, start: &str, end: &str) -> Result<Interval> {
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    Interval::try_new(id, start, end).context("Invalid interval")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

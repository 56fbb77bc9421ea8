//! "Ask why" day context: a short plain-text summary of one day's metrics
//! and chat, handed to the external insights collaborator.

use chrono::{NaiveDate, TimeZone};

use crate::config::EngineConfig;
use crate::journey::{day_deltas, MetricRow};
use crate::timeline::MergedTimeline;

/// Same-day chat lines kept in a day context.
pub const DAY_CONTEXT_MAX_LINES: usize = 10;

/// Question the insights prompt opens with for a day context.
pub const DAY_SEED_QUESTION: &str = "Why did the team make changes or recommendations today?";

const NO_SNIPPET: &str = "(none found for this day)";
const MISSING_VALUE: &str = "NA";

/// `"<who>: <text>"` for the last [`DAY_CONTEXT_MAX_LINES`] non-empty
/// messages on `day` in `tz`. Undated messages never match.
pub fn same_day_lines<Tz: TimeZone>(timeline: &MergedTimeline, day: NaiveDate, tz: &Tz) -> Vec<String> {
    let lines: Vec<String> = timeline
        .iter()
        .filter(|record| {
            record
                .timestamp
                .is_some_and(|ts| ts.with_timezone(tz).date_naive() == day)
        })
        .filter(|record| !record.text.is_empty())
        .map(|record| format!("{}: {}", record.author_name, record.text))
        .collect();

    let skip = lines.len().saturating_sub(DAY_CONTEXT_MAX_LINES);
    lines.into_iter().skip(skip).collect()
}

fn unit(metric: &str) -> &'static str {
    if metric.eq_ignore_ascii_case("sleep") {
        "h"
    } else {
        ""
    }
}

fn delta_precision(metric: &str) -> usize {
    if metric.eq_ignore_ascii_case("sleep") {
        2
    } else {
        1
    }
}

/// Context for the metric row at `idx`: date and week, member, metrics with
/// signed day-over-day deltas, and the day's chat. `None` when `idx` is out of range.
pub fn build_day_context<Tz: TimeZone>(
    rows: &[MetricRow],
    idx: usize,
    member_id: &str,
    timeline: &MergedTimeline,
    tz: &Tz,
    config: &EngineConfig,
) -> Option<String> {
    let row = rows.get(idx)?;

    let values = config
        .metric_fields
        .iter()
        .map(|name| match row.value(name) {
            Some(v) => format!("{name}={v}{}", unit(name)),
            None => format!("{name}={MISSING_VALUE}{}", unit(name)),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let deltas = day_deltas(rows, idx, &config.metric_fields)
        .iter()
        .map(|d| {
            let sign = if d.delta >= 0.0 { "+" } else { "" };
            let precision = delta_precision(&d.name);
            format!("Δ{}={sign}{:.precision$}{}", d.name, d.delta, unit(&d.name))
        })
        .collect::<Vec<_>>();

    let mut metrics = format!("Metrics: {values}");
    if !deltas.is_empty() {
        metrics.push_str(&format!(" ({})", deltas.join(", ")));
    }

    let lines = same_day_lines(timeline, row.date, tz);
    let snippet = if lines.is_empty() {
        format!("Chat snippet: {NO_SNIPPET}")
    } else {
        format!("Chat snippet:\n{}", lines.join("\n"))
    };

    Some(
        [
            format!(
                "Date: {} ({}), Week {}",
                row.date.format("%a, %-d %b %Y"),
                row.date.format("%Y-%m-%d"),
                row.week
            ),
            format!("Member: {member_id}"),
            metrics,
            snippet,
        ]
        .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{synthesize_dates, EpochWeekIndex};
    use crate::models::StoredDocument;
    use crate::normalize::ShapeNormalizer;
    use crate::timeline::merge;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    fn rows(config: &EngineConfig) -> Vec<MetricRow> {
        let records = ShapeNormalizer::new(config).normalize(&json!([
            { "id": "0", "HRV": 50, "RHR": 60, "Sleep": 7.5 },
            { "id": "1", "HRV": 47, "Sleep": 6.25 },
        ]));
        synthesize_dates(records, &EpochWeekIndex::from_config(config), config)
    }

    fn chat(config: &EngineConfig) -> MergedTimeline {
        let normalizer = ShapeNormalizer::new(config);
        let docs = vec![
            StoredDocument::new("m1", json!({ "text": "Late dinner", "role": "user", "createdAt": "2025-09-18T20:30:00Z" })),
            StoredDocument::new("m2", json!({ "text": "Noted, shift it earlier", "role": "coach", "senderName": "Advik", "createdAt": "2025-09-18T21:30:00Z" })),
            StoredDocument::new("m3", json!({ "text": "Other day", "role": "user", "createdAt": "2025-09-17T10:00:00Z" })),
            StoredDocument::new("m4", json!({ "text": "   ", "role": "user", "createdAt": "2025-09-18T22:00:00Z" })),
            StoredDocument::new("m5", json!({ "text": "No time", "role": "user" })),
        ];
        merge(&normalizer.normalize_collection(&docs), &[])
    }

    // ── same_day_lines ──

    #[test]
    fn selects_non_empty_lines_of_the_day() {
        let config = EngineConfig::default();
        let lines = same_day_lines(&chat(&config), NaiveDate::from_ymd_opt(2025, 9, 18).unwrap(), &Utc);
        assert_eq!(lines, vec!["Member: Late dinner", "Advik: Noted, shift it earlier"]);
    }

    #[test]
    fn day_is_taken_in_the_given_zone() {
        let config = EngineConfig::default();
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let lines = same_day_lines(&chat(&config), NaiveDate::from_ymd_opt(2025, 9, 19).unwrap(), &tz);
        assert_eq!(lines, vec!["Advik: Noted, shift it earlier"]);
    }

    #[test]
    fn keeps_last_ten_lines() {
        let config = EngineConfig::default();
        let docs: Vec<StoredDocument> = (0..15)
            .map(|i| {
                StoredDocument::new(
                    format!("{i:02}"),
                    json!({ "text": format!("line {i}"), "role": "coach", "createdAt": format!("2025-09-17T10:{i:02}:00Z") }),
                )
            })
            .collect();
        let timeline = merge(&ShapeNormalizer::new(&config).normalize_collection(&docs), &[]);
        let lines = same_day_lines(&timeline, NaiveDate::from_ymd_opt(2025, 9, 17).unwrap(), &Utc);

        assert_eq!(lines.len(), DAY_CONTEXT_MAX_LINES);
        assert_eq!(lines[0], "Care Team: line 5");
    }

    // ── build_day_context ──

    #[test]
    fn day_context_with_deltas_and_snippet() {
        let config = EngineConfig::default();
        let context = build_day_context(&rows(&config), 1, "rohan", &chat(&config), &Utc, &config).unwrap();

        assert_eq!(
            context,
            [
                "Date: Thu, 18 Sep 2025 (2025-09-18), Week 1",
                "Member: rohan",
                "Metrics: HRV=47, RHR=NA, Sleep=6.25h (ΔHRV=-3.0, ΔSleep=-1.25h)",
                "Chat snippet:",
                "Member: Late dinner",
                "Advik: Noted, shift it earlier",
            ]
            .join("\n")
        );
    }

    #[test]
    fn first_day_has_no_deltas() {
        let config = EngineConfig::default();
        let context = build_day_context(&rows(&config), 0, "rohan", &chat(&config), &Utc, &config).unwrap();
        assert!(context.contains("Metrics: HRV=50, RHR=60, Sleep=7.5h\n"));
        assert!(context.ends_with("Chat snippet:\nMember: Other day"));
    }

    #[test]
    fn empty_day_gets_marker() {
        let config = EngineConfig::default();
        let context =
            build_day_context(&rows(&config), 0, "rohan", &MergedTimeline::default(), &Utc, &config).unwrap();
        assert!(context.ends_with("Chat snippet: (none found for this day)"));
    }

    #[test]
    fn out_of_range_row_has_no_context() {
        let config = EngineConfig::default();
        assert!(build_day_context(&rows(&config), 5, "rohan", &chat(&config), &Utc, &config).is_none());
    }
}

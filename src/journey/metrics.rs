//! Metric rows: one row per day on the epoch grid, plus the series, deltas
//! and week groups derived from them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::CanonicalRecord;
use crate::normalize::coerce::coerce_number;

use super::weeks::{resolve_bucket_id, EpochWeekIndex, WeekRange};

/// One day of metrics. `date` is always resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub id: String,
    pub date: NaiveDate,
    pub week: u32,
    pub metrics: BTreeMap<String, f64>,
    pub raw: Value,
}

impl MetricRow {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Numeric values of the configured metric fields; unreadable values are skipped.
pub fn metric_values(record: &CanonicalRecord, fields: &[String]) -> BTreeMap<String, f64> {
    fields
        .iter()
        .filter_map(|field| {
            let value = record.raw_field(field).and_then(coerce_number)?;
            Some((field.clone(), value))
        })
        .collect()
}

fn numeric_id(id: &str) -> Option<f64> {
    let n = id.trim().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Numeric ids first (by value, then id); the rest by their own
/// timestamp (undated first), then id.
fn synthesis_order(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    match (numeric_id(&a.id), numeric_id(&b.id)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .timestamp_millis()
            .cmp(&b.timestamp_millis())
            .then_with(|| a.id.cmp(&b.id)),
    }
}

/// Lay rows out one per day from the epoch.
///
/// Rows are ordered by numeric id, else by their own date, else by id, and
/// row `i` is dated `epoch + i` days. Any original date is discarded so
/// every week holds exactly seven consecutive days.
pub fn synthesize_dates(
    mut records: Vec<CanonicalRecord>,
    index: &EpochWeekIndex,
    config: &EngineConfig,
) -> Vec<MetricRow> {
    records.sort_by(synthesis_order);

    let rows: Vec<MetricRow> = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let date = index.day(i as u64);
            MetricRow {
                metrics: metric_values(&record, &config.metric_fields),
                week: index.week_of(date),
                date,
                id: record.id,
                raw: record.raw,
            }
        })
        .collect();

    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        tracing::debug!(
            rows = rows.len(),
            first = %first.date,
            last = %last.date,
            "Synthesized metric dates"
        );
    }
    rows
}

// ═══════════════════════════════════════════
// Series and deltas
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: usize,
    pub y: f64,
}

/// Sparkline data for one metric. `x` is the row position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
    pub min: f64,
    pub max: f64,
}

impl MetricSeries {
    /// Missing values leave a gap. With no points at all the range is 0..1.
    pub fn from_values(name: &str, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let points: Vec<SeriesPoint> = values
            .into_iter()
            .enumerate()
            .filter_map(|(x, y)| y.map(|y| SeriesPoint { x, y }))
            .collect();

        let (min, max) = if points.is_empty() {
            (0.0, 1.0)
        } else {
            points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            })
        };

        Self {
            name: name.to_string(),
            points,
            min,
            max,
        }
    }

    pub fn from_rows(name: &str, rows: &[MetricRow]) -> Self {
        Self::from_values(name, rows.iter().map(|row| row.value(name)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Change of one metric against the previous row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub name: String,
    pub value: f64,
    pub previous: f64,
    pub delta: f64,
}

/// Per-metric difference between row `idx` and row `idx - 1`, in `fields`
/// order, for metrics present on both rows.
pub fn day_deltas(rows: &[MetricRow], idx: usize, fields: &[String]) -> Vec<MetricDelta> {
    let (Some(current), Some(previous)) = (rows.get(idx), idx.checked_sub(1).and_then(|i| rows.get(i)))
    else {
        return Vec::new();
    };

    fields
        .iter()
        .filter_map(|name| {
            let value = current.value(name)?;
            let previous = previous.value(name)?;
            Some(MetricDelta {
                name: name.clone(),
                value,
                previous,
                delta: value - previous,
            })
        })
        .collect()
}

// ═══════════════════════════════════════════
// Week groups
// ═══════════════════════════════════════════

/// The rows of one week, with what a view needs to link to that week's chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekGroup<'a> {
    pub week: u32,
    pub range: WeekRange,
    pub label: String,
    pub bucket_id: String,
    pub rows: Vec<&'a MetricRow>,
}

/// One group per week that has rows, ascending.
pub fn group_by_week<'a, S: AsRef<str>>(
    rows: &'a [MetricRow],
    index: &EpochWeekIndex,
    known_bucket_ids: &[S],
) -> Vec<WeekGroup<'a>> {
    let mut by_week: BTreeMap<u32, Vec<&'a MetricRow>> = BTreeMap::new();
    for row in rows {
        by_week.entry(row.week).or_default().push(row);
    }

    by_week
        .into_iter()
        .map(|(week, rows)| WeekGroup {
            week,
            range: index.range_of(week),
            label: index.label(week),
            bucket_id: resolve_bucket_id(week, known_bucket_ids),
            rows,
        })
        .collect()
}

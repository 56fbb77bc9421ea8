//! Home dashboard derivations: metric sparklines, recent week chips and
//! the chat bucket the "open chat" entry points at.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::journey::{
    latest_bucket_id, load_first_available, metric_values, EpochWeekIndex, MetricSeries,
    SourceAttempt,
};
use crate::normalize::ShapeNormalizer;

/// Number of most recent weeks shown as chips.
pub const RECENT_WEEK_CHIPS: usize = 6;

/// Last reading of one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekChip {
    pub week: u32,
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricPreview {
    /// One series per configured metric, in config order.
    pub series: Vec<MetricSeries>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub recent_weeks: Vec<WeekChip>,
    pub tried: Vec<String>,
}

impl MetricPreview {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(MetricSeries::is_empty)
    }
}

/// Metric preview from the first location that has readings.
///
/// Unlike the progress grid, readings keep their own dates here: they are
/// ordered by date (undated first) and undated readings get no week chip.
pub fn metric_preview(
    config: &EngineConfig,
    attempts: impl IntoIterator<Item = SourceAttempt>,
) -> MetricPreview {
    let load = load_first_available(&ShapeNormalizer::new(config), attempts);
    let index = EpochWeekIndex::from_config(config);

    let mut records = load.records;
    records.sort_by_key(|record| record.timestamp_millis());

    let readings: Vec<(Option<NaiveDate>, BTreeMap<String, f64>)> = records
        .iter()
        .map(|record| {
            (
                record.timestamp.map(|ts| ts.date_naive()),
                metric_values(record, &config.metric_fields),
            )
        })
        .collect();

    let series = config
        .metric_fields
        .iter()
        .map(|name| {
            MetricSeries::from_values(name, readings.iter().map(|(_, values)| values.get(name).copied()))
        })
        .collect();

    let mut by_week: BTreeMap<u32, WeekChip> = BTreeMap::new();
    for (date, values) in &readings {
        if let Some(date) = *date {
            let week = index.week_of(date);
            by_week.insert(
                week,
                WeekChip {
                    week,
                    date,
                    values: values.clone(),
                },
            );
        }
    }
    let skip = by_week.len().saturating_sub(RECENT_WEEK_CHIPS);
    let recent_weeks = by_week.into_values().skip(skip).collect();

    MetricPreview {
        series,
        first_date: readings.first().and_then(|(date, _)| *date),
        last_date: readings.last().and_then(|(date, _)| *date),
        recent_weeks,
        tried: load.tried,
    }
}

/// Bucket the home page's chat entry opens: the latest existing week, else `"01"`.
pub fn chat_entry_bucket<S: AsRef<str>>(bucket_ids: &[S]) -> String {
    latest_bucket_id(bucket_ids)
}

//! Journey: metrics, labs and decisions on the epoch week grid.
//!
//! Metric rows are laid out one per day from the epoch, grouped into
//! 7-day weeks, and linked to the matching week's chat bucket.

mod decisions;
mod labs;
mod metrics;
mod sources;
mod weeks;

pub use decisions::*;
pub use labs::*;
pub use metrics::*;
pub use sources::*;
pub use weeks::*;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::normalize::ShapeNormalizer;

/// Metric rows of one member, dated on the epoch grid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsLoad {
    pub rows: Vec<MetricRow>,
    pub tried: Vec<String>,
}

/// Load metric rows from the first location that has any and synthesize their dates.
pub fn load_metric_rows(
    config: &EngineConfig,
    attempts: impl IntoIterator<Item = SourceAttempt>,
) -> MetricsLoad {
    let load = load_first_available(&ShapeNormalizer::new(config), attempts);
    let index = EpochWeekIndex::from_config(config);
    MetricsLoad {
        rows: synthesize_dates(load.records, &index, config),
        tried: load.tried,
    }
}

/// Load lab entries from the first location that has any, ordered by date.
pub fn load_lab_entries(
    config: &EngineConfig,
    attempts: impl IntoIterator<Item = SourceAttempt>,
) -> Vec<LabEntry> {
    lab_entries(load_first_available(&ShapeNormalizer::new(config), attempts).records)
}

// ── Tests ──────────────────────────────────────────────────────────────────

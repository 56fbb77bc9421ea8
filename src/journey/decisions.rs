//! Care decisions recorded on week documents, listed across all weeks.
//!
//! Each week document holds `decisions` as a list or an ordinal-keyed map,
//! and each decision holds `links` the same way.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::{CanonicalRecord, StoredDocument};
use crate::normalize::coerce::first_non_empty;
use crate::normalize::{list_or_map_values, ShapeNormalizer};

pub const DECISIONS_FIELD: &str = "decisions";

const TIMESTAMP_FIELDS: &[&str] = &["ts", "date"];
const MARKER_FIELDS: &[&str] = &["ts", "kind", "summary", "rationale", "links"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionLink {
    pub id: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Week bucket the decision was recorded in.
    pub week_id: String,
    pub id: String,
    pub when: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub summary: Option<String>,
    pub rationale: Option<String>,
    pub links: Vec<DecisionLink>,
    pub raw: Value,
}

impl Decision {
    fn from_record(week_id: &str, record: CanonicalRecord) -> Self {
        let links = record
            .raw
            .get("links")
            .map(list_or_map_values)
            .unwrap_or_default()
            .into_iter()
            .filter_map(decision_link)
            .collect();

        Self {
            week_id: week_id.to_string(),
            when: record.timestamp,
            kind: first_non_empty(&record.raw, &["kind"]),
            summary: first_non_empty(&record.raw, &["summary"]),
            rationale: first_non_empty(&record.raw, &["rationale"]),
            links,
            id: record.id,
            raw: record.raw,
        }
    }
}

/// Links with neither an id nor a type carry nothing and are skipped.
fn decision_link(value: &Value) -> Option<DecisionLink> {
    let link = DecisionLink {
        id: first_non_empty(value, &["id"]),
        kind: first_non_empty(value, &["type"]),
    };
    (link.id.is_some() || link.kind.is_some()).then_some(link)
}

/// The engine config with decision timestamps (`ts`, then `date`) and markers.
fn decision_config(config: &EngineConfig) -> EngineConfig {
    let mut decision = config.clone();
    decision.aliases.timestamp = TIMESTAMP_FIELDS.iter().map(|f| f.to_string()).collect();
    decision
        .shapes
        .extra_markers
        .extend(MARKER_FIELDS.iter().map(|f| f.to_string()));
    decision
}

/// Decisions of one week document, in stored order.
pub fn week_decisions(normalizer: &ShapeNormalizer<'_>, week: &StoredDocument) -> Vec<Decision> {
    let Some(raw) = week.data.get(DECISIONS_FIELD) else {
        return Vec::new();
    };
    normalizer
        .normalize(raw)
        .into_iter()
        .map(|record| Decision::from_record(&week.id, record))
        .collect()
}

/// Decisions across all week documents, newest first. Undated decisions come
/// last; ties keep week then stored order.
pub fn collect_decisions(config: &EngineConfig, weeks: &[StoredDocument]) -> Vec<Decision> {
    let config = decision_config(config);
    let normalizer = ShapeNormalizer::new(&config);

    let mut decisions: Vec<Decision> = weeks
        .iter()
        .flat_map(|week| week_decisions(&normalizer, week))
        .collect();
    decisions.sort_by_key(|decision| Reverse(decision.when));

    tracing::debug!(
        decisions = decisions.len(),
        weeks = weeks.len(),
        "Loaded decisions"
    );
    decisions
}

//! Source fallback: the same logical data may live in a subcollection or
//! inside a single document; take the first location that yields records.

use serde::Serialize;

use crate::live::FeedSnapshot;
use crate::models::CanonicalRecord;
use crate::normalize::ShapeNormalizer;

/// One labelled location, already fetched.
#[derive(Debug, Clone)]
pub struct SourceAttempt {
    pub label: String,
    pub snapshot: FeedSnapshot,
}

impl SourceAttempt {
    pub fn new(label: impl Into<String>, snapshot: FeedSnapshot) -> Self {
        Self {
            label: label.into(),
            snapshot,
        }
    }
}

/// Result of a fallback load: the records plus every location tried, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceLoad {
    pub records: Vec<CanonicalRecord>,
    pub tried: Vec<String>,
    /// Label of the location the records came from.
    pub source: Option<String>,
}

impl SourceLoad {
    /// `"a -> b (unavailable) -> c"`, for diagnostics.
    pub fn trail(&self) -> String {
        self.tried.join(" -> ")
    }
}

/// Normalize each attempt in preference order until one yields records.
pub fn load_first_available(
    normalizer: &ShapeNormalizer<'_>,
    attempts: impl IntoIterator<Item = SourceAttempt>,
) -> SourceLoad {
    let mut load = SourceLoad::default();

    for attempt in attempts {
        load.tried.push(if attempt.snapshot.is_available() {
            attempt.label.clone()
        } else {
            format!("{} (unavailable)", attempt.label)
        });

        let records = attempt.snapshot.normalize(normalizer);
        if !records.is_empty() {
            tracing::debug!(
                source = %attempt.label,
                records = records.len(),
                tried = %load.trail(),
                "Loaded records"
            );
            load.records = records;
            load.source = Some(attempt.label);
            return load;
        }
    }

    tracing::debug!(tried = %load.trail(), "No source yielded records");
    load
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::StoredDocument;
    use serde_json::json;

    #[test]
    fn first_non_empty_source_wins() {
        let config = EngineConfig::default();
        let normalizer = ShapeNormalizer::new(&config);
        let load = load_first_available(
            &normalizer,
            [
                SourceAttempt::new("metrics (subcollection)", FeedSnapshot::Collection(Vec::new())),
                SourceAttempt::new("metrics (doc)", FeedSnapshot::Document(Some(json!({ "items": [{ "HRV": 50 }] })))),
                SourceAttempt::new("never reached", FeedSnapshot::Collection(vec![StoredDocument::new("x", json!({ "HRV": 1 }))])),
            ],
        );

        assert_eq!(load.records.len(), 1);
        assert_eq!(load.source.as_deref(), Some("metrics (doc)"));
        assert_eq!(load.trail(), "metrics (subcollection) -> metrics (doc)");
    }

    #[test]
    fn unavailable_and_flat_sources_fall_through() {
        let config = EngineConfig::default();
        let normalizer = ShapeNormalizer::new(&config);
        let load = load_first_available(
            &normalizer,
            [
                SourceAttempt::new("labs (subcollection)", FeedSnapshot::Unavailable),
                SourceAttempt::new("labs (doc)", FeedSnapshot::Document(Some(json!({ "owner": "m-42" })))),
            ],
        );

        assert!(load.records.is_empty());
        assert!(load.source.is_none());
        assert_eq!(load.tried, vec!["labs (subcollection) (unavailable)", "labs (doc)"]);
    }
}

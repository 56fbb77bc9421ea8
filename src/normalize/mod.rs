//! Shape normalizer: turns one raw payload of unknown layout into an
//! ordered list of canonical records.
//!
//! Three physical shapes carry the same logical collection:
//! - a collection of individually-keyed documents (`normalize_collection`)
//! - a document holding an array field
//! - a document holding a map field with non-ordinal keys
//!
//! Normalization never fails: a payload with no recognizable shape yields
//! an empty list, and a field that cannot be coerced is left empty on its
//! record.

pub mod coerce;
pub mod shape;

use std::collections::HashSet;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::{CanonicalRecord, RecordShape, StoredDocument};

pub use shape::{detect_shape, list_or_map_values, looks_like_record, ShapeMatch};

pub struct ShapeNormalizer<'c> {
    config: &'c EngineConfig,
}

impl<'c> ShapeNormalizer<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c EngineConfig {
        self.config
    }

    /// Normalize a single-document payload (array or map shape).
    pub fn normalize(&self, raw: &Value) -> Vec<CanonicalRecord> {
        let detected = detect_shape(raw, self.config);
        let shape = detected.shape();
        let mut ids = UniqueIds::default();

        let records: Vec<CanonicalRecord> = match detected {
            ShapeMatch::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let source_id = coerce::first_non_empty(item, &self.config.aliases.source_id);
                    let id = ids.claim(source_id, index);
                    self.record(id, item)
                })
                .collect(),
            ShapeMatch::Map(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(index, (key, value))| {
                    let id = ids.claim(Some(key.to_string()), index);
                    self.record(id, value)
                })
                .collect(),
            ShapeMatch::Flat => Vec::new(),
        };

        tracing::debug!(shape = %shape, records = records.len(), "Normalized document");
        records
    }

    /// Normalize a collection-shaped feed: one record per stored document.
    pub fn normalize_collection(&self, docs: &[StoredDocument]) -> Vec<CanonicalRecord> {
        let mut ids = UniqueIds::default();
        let records: Vec<CanonicalRecord> = docs
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let id = ids.claim(Some(doc.id.clone()), index);
                self.record(id, &doc.data)
            })
            .collect();

        tracing::debug!(
            shape = %RecordShape::Collection,
            records = records.len(),
            "Normalized collection"
        );
        records
    }

    /// Coerce one payload into a canonical record under the given id.
    pub fn record(&self, id: String, payload: &Value) -> CanonicalRecord {
        let aliases = &self.config.aliases;
        let author_role = coerce::coerce_role(payload, self.config);
        let author_name = coerce::coerce_display_name(payload, &author_role, self.config);

        CanonicalRecord {
            id,
            timestamp: coerce::coerce_record_timestamp(payload, &aliases.timestamp),
            text: coerce::coerce_text(payload, &aliases.text, &aliases.nested_text),
            author_role,
            author_name,
            author_id: coerce::coerce_author_id(payload, self.config),
            raw: payload.clone(),
        }
    }
}

/// Hands out ids that are unique within one normalization pass.
#[derive(Default)]
struct UniqueIds {
    seen: HashSet<String>,
}

impl UniqueIds {
    /// Prefer the candidate, then the position, then the position with a suffix.
    fn claim(&mut self, candidate: Option<String>, index: usize) -> String {
        if let Some(id) = candidate.filter(|id| !self.seen.contains(id)) {
            self.seen.insert(id.clone());
            return id;
        }
        let mut id = index.to_string();
        let mut suffix = 1;
        while self.seen.contains(&id) {
            id = format!("{index}~{suffix}");
            suffix += 1;
        }
        self.seen.insert(id.clone());
        id
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

//! Lab entries: dated markers along a member's journey.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::models::CanonicalRecord;
use crate::normalize::coerce::first_non_empty;

const TITLE_FIELDS: &[&str] = &["title", "name"];
const NOTE_FIELDS: &[&str] = &["note", "notes", "summary"];
const KIND_FIELDS: &[&str] = &["type", "kind", "category"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabEntry {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub note: Option<String>,
    pub kind: Option<String>,
    pub raw: Value,
}

impl From<CanonicalRecord> for LabEntry {
    fn from(record: CanonicalRecord) -> Self {
        Self {
            date: record.timestamp.map(|ts| ts.date_naive()),
            title: first_non_empty(&record.raw, TITLE_FIELDS),
            note: first_non_empty(&record.raw, NOTE_FIELDS),
            kind: first_non_empty(&record.raw, KIND_FIELDS),
            id: record.id,
            raw: record.raw,
        }
    }
}

impl LabEntry {
    /// Title, else kind, else "Lab".
    pub fn heading(&self) -> &str {
        self.title
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("Lab")
    }
}

/// Entries ordered by date; undated entries first, input order kept among equals.
pub fn lab_entries(records: Vec<CanonicalRecord>) -> Vec<LabEntry> {
    let mut entries: Vec<LabEntry> = records.into_iter().map(LabEntry::from).collect();
    entries.sort_by_key(|entry| entry.date);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::normalize::ShapeNormalizer;
    use serde_json::json;

    #[test]
    fn map_shaped_labs_sorted_by_date() {
        let config = EngineConfig::default();
        let raw = json!({
            "lipids": { "date": "2025-10-20", "title": "Lipid panel", "type": "blood" },
            "baseline": { "date": "2025-09-18", "title": "Baseline bloods", "note": "fasting" },
            "pending": { "title": "DEXA scan" },
        });
        let entries = lab_entries(ShapeNormalizer::new(&config).normalize(&raw));

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["pending", "baseline", "lipids"]);
        assert_eq!(entries[1].note.as_deref(), Some("fasting"));
        assert_eq!(entries[2].kind.as_deref(), Some("blood"));
        assert_eq!(entries[2].date, NaiveDate::from_ymd_opt(2025, 10, 20));
    }

    #[test]
    fn same_date_keeps_input_order() {
        let config = EngineConfig::default();
        let raw = json!([
            { "date": "2025-09-20", "title": "second" },
            { "date": "2025-09-20", "title": "first?" },
        ]);
        let entries = lab_entries(ShapeNormalizer::new(&config).normalize(&raw));
        assert_eq!(entries[0].title.as_deref(), Some("second"));
    }

    #[test]
    fn heading_falls_back() {
        let config = EngineConfig::default();
        let entries = lab_entries(ShapeNormalizer::new(&config).normalize(&json!([
            { "type": "imaging", "date": "2025-09-20" },
            { "note": "just a note" },
        ])));
        assert_eq!(entries[0].heading(), "Lab");
        assert_eq!(entries[1].heading(), "imaging");
    }
}

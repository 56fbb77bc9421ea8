use chrono::NaiveDate;
use serde::Serialize;

use crate::models::CanonicalRecord;

/// Composite key deciding whether two records are the same logical event.
///
/// Built from normalized text, role, instant (epoch millis, or empty) and
/// author identifier (or empty). No store-assigned id takes part, so the
/// same event seen through two physical shapes collapses to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Fingerprint {
    pub text: String,
    pub role: String,
    pub timestamp: String,
    pub author: String,
}

impl From<&CanonicalRecord> for Fingerprint {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            text: record.text.clone(),
            role: record.author_role.as_str().to_string(),
            timestamp: record
                .timestamp_millis()
                .map(|ms| ms.to_string())
                .unwrap_or_default(),
            author: record.author_id.clone().unwrap_or_default(),
        }
    }
}

/// Deduplicated records ordered by `(timestamp, id)`, undated first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedTimeline {
    records: Vec<CanonicalRecord>,
}

impl MergedTimeline {
    /// Callers must uphold the ordering and uniqueness invariants.
    pub(crate) fn from_sorted(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    /// The newest record; views scroll here after each recomputation.
    pub fn last(&self) -> Option<&CanonicalRecord> {
        self.records.last()
    }

    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        self.records.iter().map(Fingerprint::from).collect()
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a MergedTimeline {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One row of a day-grouped chat view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineItem<'a> {
    /// Separator before the first record of a calendar day.
    /// `day` is `None` for the leading run of undated records.
    DayHeader { day: Option<NaiveDate>, label: String },
    Record(&'a CanonicalRecord),
}

impl<'a> TimelineItem<'a> {
    pub fn as_record(&self) -> Option<&'a CanonicalRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::DayHeader { .. } => None,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Self::DayHeader { .. })
    }
}

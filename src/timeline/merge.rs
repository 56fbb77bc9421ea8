//! Record merger: combines two independently-updating sources of the same
//! logical collection into one deduplicated, time-ordered timeline.
//!
//! Always a full recomputation over the latest snapshot of each source;
//! there is no incremental patching.

use std::collections::HashSet;

use crate::models::{CanonicalRecord, FeedKind, MergePriority};

use super::types::{Fingerprint, MergedTimeline};

/// Merge with the default priority (second source visited first).
pub fn merge(source_a: &[CanonicalRecord], source_b: &[CanonicalRecord]) -> MergedTimeline {
    merge_with_priority(source_a, source_b, MergePriority::default())
}

/// Merge two sources. Of two records with equal fingerprints the one visited
/// first survives; `priority` names the source visited first.
pub fn merge_with_priority(
    source_a: &[CanonicalRecord],
    source_b: &[CanonicalRecord],
    priority: MergePriority,
) -> MergedTimeline {
    let (first, second) = match priority {
        MergePriority::FirstSource => (source_a, source_b),
        MergePriority::SecondSource => (source_b, source_a),
    };

    let mut seen: HashSet<Fingerprint> = HashSet::with_capacity(first.len() + second.len());
    let mut merged: Vec<CanonicalRecord> = Vec::with_capacity(first.len() + second.len());

    for record in first.iter().chain(second) {
        if seen.insert(Fingerprint::from(record)) {
            merged.push(record.clone());
        }
    }

    let dropped = first.len() + second.len() - merged.len();

    // Stable: equal (timestamp, id) pairs keep their visiting order.
    merged.sort_by(|a, b| {
        a.timestamp_millis()
            .cmp(&b.timestamp_millis())
            .then_with(|| a.id.cmp(&b.id))
    });

    tracing::debug!(
        source_a = source_a.len(),
        source_b = source_b.len(),
        merged = merged.len(),
        dropped,
        "Merged timeline sources"
    );

    MergedTimeline::from_sorted(merged)
}

/// The two named input slots of one logical collection.
///
/// Each feed update replaces its slot wholesale and triggers one
/// recomputation. The document feed is merge input A and the collection
/// feed is input B, so the default priority prefers collection records.
#[derive(Debug, Clone, Default)]
pub struct TimelineSlots {
    collection: Vec<CanonicalRecord>,
    document: Vec<CanonicalRecord>,
    priority: MergePriority,
    merged: MergedTimeline,
}

impl TimelineSlots {
    pub fn new(priority: MergePriority) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Replace one slot and recompute the merged timeline.
    pub fn replace(&mut self, kind: FeedKind, records: Vec<CanonicalRecord>) -> &MergedTimeline {
        match kind {
            FeedKind::Collection => self.collection = records,
            FeedKind::Document => self.document = records,
        }
        self.merged = merge_with_priority(&self.document, &self.collection, self.priority);
        &self.merged
    }

    pub fn slot(&self, kind: FeedKind) -> &[CanonicalRecord] {
        match kind {
            FeedKind::Collection => &self.collection,
            FeedKind::Document => &self.document,
        }
    }

    pub fn merged(&self) -> &MergedTimeline {
        &self.merged
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

//! Chat timeline: merges the collection feed and the document feed of one
//! week's messages into a single deduplicated, chronological sequence and
//! splits it into calendar days for display.

mod grouping;
mod merge;
mod types;

pub use grouping::*;
pub use merge::{merge, merge_with_priority, TimelineSlots};
pub use types::*;

// ── Tests ──────────────────────────────────────────────────────────────────

//! Epoch week index: 1-based, 7-day-wide week numbers anchored at the
//! program epoch, plus the helpers that address week-bucketed resources.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::config::EngineConfig;

pub const DAYS_PER_WEEK: u64 = 7;

/// Bucket id used when no bucket exists yet.
pub const DEFAULT_BUCKET_ID: &str = "01";

/// Maps dates to week numbers relative to a fixed epoch, and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochWeekIndex {
    epoch: NaiveDate,
}

/// Inclusive date range of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%-d %b %Y"),
            self.end.format("%-d %b %Y")
        )
    }
}

impl EpochWeekIndex {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.epoch)
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// `max(1, floor((date - epoch) / 7) + 1)`. Dates before the epoch are week 1.
    pub fn week_of(&self, date: NaiveDate) -> u32 {
        let days = date.signed_duration_since(self.epoch).num_days();
        let week = days.div_euclid(DAYS_PER_WEEK as i64) + 1;
        u32::try_from(week.max(1)).unwrap_or(u32::MAX)
    }

    /// Week of an instant, by its UTC calendar date.
    pub fn week_of_instant(&self, ts: &DateTime<Utc>) -> u32 {
        self.week_of(ts.date_naive())
    }

    /// `epoch + (week - 1) * 7` through six days later. Week 0 is read as week 1.
    pub fn range_of(&self, week: u32) -> WeekRange {
        let week = week.max(1);
        let start = self.day(u64::from(week - 1) * DAYS_PER_WEEK);
        let end = start
            .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
            .unwrap_or(NaiveDate::MAX);
        WeekRange { week, start, end }
    }

    /// The date `offset` days after the epoch.
    pub fn day(&self, offset: u64) -> NaiveDate {
        self.epoch
            .checked_add_days(Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn label(&self, week: u32) -> String {
        format!("Week {}", week.max(1))
    }
}

// ═══════════════════════════════════════════
// Bucket ids
// ═══════════════════════════════════════════

/// Resolve a week number to the bucket id variant that actually exists.
///
/// Week ids are stored as `"7"`, `"07"` or `"007"` depending on who wrote
/// them; the first variant present in `known` wins, otherwise the unpadded
/// number.
pub fn resolve_bucket_id<S: AsRef<str>>(week: u32, known: &[S]) -> String {
    let raw = week.to_string();
    let candidates = [raw.clone(), format!("{week:02}"), format!("{week:03}")];
    candidates
        .into_iter()
        .find(|candidate| known.iter().any(|id| id.as_ref() == candidate.as_str()))
        .unwrap_or(raw)
}

fn bucket_number(id: &str) -> Option<u64> {
    id.trim().parse::<u64>().ok()
}

fn compare_bucket_ids(a: &str, b: &str) -> Ordering {
    match (bucket_number(a), bucket_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Numeric order; non-numeric ids sort after numeric ones, by string.
pub fn sort_bucket_ids(ids: &mut [String]) {
    ids.sort_by(|a, b| compare_bucket_ids(a, b));
}

/// Highest bucket id, or [`DEFAULT_BUCKET_ID`] when there are none.
pub fn latest_bucket_id<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(|id| id.as_ref())
        .filter(|id| bucket_number(id).is_some())
        .max_by(|a, b| compare_bucket_ids(a, b))
        .unwrap_or(DEFAULT_BUCKET_ID)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn index() -> EpochWeekIndex {
        EpochWeekIndex::new(date(2025, 9, 17))
    }

    // ── week_of ──

    #[test]
    fn epoch_is_week_one() {
        assert_eq!(index().week_of(date(2025, 9, 17)), 1);
        assert_eq!(index().week_of(date(2025, 9, 23)), 1);
        assert_eq!(index().week_of(date(2025, 9, 24)), 2);
    }

    #[test]
    fn dates_before_epoch_clamp_to_week_one() {
        assert_eq!(index().week_of(date(2025, 9, 16)), 1);
        assert_eq!(index().week_of(date(2020, 1, 1)), 1);
    }

    #[test]
    fn week_numbers_never_decrease() {
        let index = index();
        let mut previous = 0;
        let mut day = date(2025, 8, 1);
        while day < date(2026, 3, 1) {
            let week = index.week_of(day);
            assert!(week >= previous, "week went backwards at {day}");
            previous = week;
            day = day.succ_opt().unwrap();
        }
        assert_eq!(previous, index.week_of(date(2026, 2, 28)));
    }

    #[test]
    fn instant_uses_its_utc_date() {
        let index = index();
        let late = DateTime::parse_from_rfc3339("2025-09-23T23:30:00-02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(index.week_of_instant(&late), 2);
        let start = DateTime::parse_from_rfc3339("2025-09-17T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(index.week_of_instant(&start), 1);
    }

    #[test]
    fn other_epoch_without_global_state() {
        let index = EpochWeekIndex::new(date(2024, 1, 1));
        assert_eq!(index.week_of(date(2024, 1, 15)), 3);
    }

    // ── range_of ──

    #[test]
    fn range_is_seven_days_from_epoch() {
        let range = index().range_of(2);
        assert_eq!(range.start, date(2025, 9, 24));
        assert_eq!(range.end, date(2025, 9, 30));
        assert!(range.contains(date(2025, 9, 27)));
        assert!(!range.contains(date(2025, 10, 1)));
    }

    #[test]
    fn range_round_trips_with_week_of() {
        let index = index();
        for week in 1..=20 {
            let range = index.range_of(week);
            assert_eq!(index.week_of(range.start), week);
            assert_eq!(index.week_of(range.end), week);
        }
    }

    #[test]
    fn range_display_and_label() {
        let index = index();
        assert_eq!(index.range_of(1).to_string(), "17 Sep 2025 - 23 Sep 2025");
        assert_eq!(index.label(3), "Week 3");
        assert_eq!(index.range_of(0).week, 1);
    }

    // ── Bucket ids ──

    #[test]
    fn resolves_padded_variant_that_exists() {
        let known = ["01", "02", "03", "04", "05", "06", "07"];
        assert_eq!(resolve_bucket_id(7, &known), "07");
    }

    #[test]
    fn prefers_unpadded_when_present() {
        assert_eq!(resolve_bucket_id(7, &["7", "07"]), "7");
        assert_eq!(resolve_bucket_id(7, &["007"]), "007");
    }

    #[test]
    fn falls_back_to_unpadded() {
        let known: [&str; 0] = [];
        assert_eq!(resolve_bucket_id(12, &known), "12");
        assert_eq!(resolve_bucket_id(12, &["01", "02"]), "12");
    }

    #[test]
    fn bucket_ids_sort_numerically() {
        let mut ids: Vec<String> = ["10", "9", "notes", "02", "1"].iter().map(|s| s.to_string()).collect();
        sort_bucket_ids(&mut ids);
        assert_eq!(ids, vec!["1", "02", "9", "10", "notes"]);
    }

    #[test]
    fn latest_bucket_is_numeric_max() {
        assert_eq!(latest_bucket_id(&["01", "09", "10", "02"]), "10");
        assert_eq!(latest_bucket_id(&["drafts"]), "01");
        let none: [&str; 0] = [];
        assert_eq!(latest_bucket_id(&none), "01");
    }
}

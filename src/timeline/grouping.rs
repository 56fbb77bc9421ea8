//! Day grouper: splits an ordered timeline into calendar days with
//! human-relative headers.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

use super::types::{MergedTimeline, TimelineItem};

pub const TODAY_LABEL: &str = "Today";
pub const YESTERDAY_LABEL: &str = "Yesterday";
pub const UNKNOWN_DAY_LABEL: &str = "Unknown date";

/// Groups by the calendar day of each record in `tz`, labelled relative to `today`.
#[derive(Debug, Clone)]
pub struct DayGrouper<Tz: TimeZone> {
    tz: Tz,
    today: NaiveDate,
}

impl DayGrouper<Local> {
    /// Group by the machine's local calendar, relative to the current date.
    pub fn local() -> Self {
        Self::new(Local, Local::now().date_naive())
    }
}

impl<Tz: TimeZone> DayGrouper<Tz> {
    pub fn new(tz: Tz, today: NaiveDate) -> Self {
        Self { tz, today }
    }

    pub fn day_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    /// Emit a header before the first record of each new day.
    ///
    /// Undated records get one "Unknown date" header before the first run
    /// of them and none afterwards; they do not reset the current day.
    pub fn group<'a>(&self, timeline: &'a MergedTimeline) -> Vec<TimelineItem<'a>> {
        let mut items = Vec::with_capacity(timeline.len() * 2);
        let mut current_day: Option<NaiveDate> = None;
        let mut unknown_header_done = false;

        for record in timeline {
            match record.timestamp.as_ref().map(|ts| self.day_of(ts)) {
                Some(day) if current_day != Some(day) => {
                    items.push(TimelineItem::DayHeader {
                        day: Some(day),
                        label: self.label(day),
                    });
                    current_day = Some(day);
                }
                Some(_) => {}
                None if !unknown_header_done => {
                    items.push(TimelineItem::DayHeader {
                        day: None,
                        label: UNKNOWN_DAY_LABEL.into(),
                    });
                    unknown_header_done = true;
                }
                None => {}
            }
            items.push(TimelineItem::Record(record));
        }
        items
    }

    /// "Today", "Yesterday", or e.g. "17 September" (year added when it differs).
    pub fn label(&self, day: NaiveDate) -> String {
        if day == self.today {
            return TODAY_LABEL.into();
        }
        if Some(day) == self.today.pred_opt() {
            return YESTERDAY_LABEL.into();
        }
        if day.year() == self.today.year() {
            day.format("%-d %B").to_string()
        } else {
            day.format("%-d %B %Y").to_string()
        }
    }
}

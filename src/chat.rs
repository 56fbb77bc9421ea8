//! Chat view helpers: which side a message renders on, and the plain-text
//! transcript handed to the external insights collaborator.

use std::fmt::Display;

use chrono::TimeZone;

use crate::config::EngineConfig;
use crate::journey::{EpochWeekIndex, WeekRange};
use crate::models::CanonicalRecord;
use crate::normalize::coerce::first_non_empty;
use crate::timeline::MergedTimeline;

/// Most recent messages included in a chat context.
pub const CONTEXT_MAX_MESSAGES: usize = 200;
/// Character cap of a chat context; the tail is kept.
pub const CONTEXT_MAX_CHARS: usize = 12_000;

const CONTEXT_RULE: &str = "----------------------------------------";

/// True when the message belongs on the member's side of the conversation.
///
/// A raw sender name mentioning "member" decides it; otherwise the resolved role.
pub fn is_member_message(record: &CanonicalRecord, config: &EngineConfig) -> bool {
    let sender = first_non_empty(&record.raw, &config.aliases.display_name).unwrap_or_default();
    sender.to_lowercase().contains("member") || record.author_role.is_member()
}

/// Date range of a week bucket id such as `"07"`; `None` when it is not a number.
pub fn week_range_for_bucket(bucket_id: &str, index: &EpochWeekIndex) -> Option<WeekRange> {
    let week = bucket_id.trim().parse::<u32>().ok()?;
    Some(index.range_of(week))
}

/// Identifies whose chat a context transcript belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ChatContextHeader<'a> {
    pub member_label: &'a str,
    pub member_id: &'a str,
    pub bucket_id: &'a str,
}

/// Transcript of the newest messages, oldest first, capped at
/// [`CONTEXT_MAX_CHARS`] characters (the head is cut when over).
pub fn build_chat_context<Tz>(
    timeline: &MergedTimeline,
    header: &ChatContextHeader<'_>,
    index: &EpochWeekIndex,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let week = match week_range_for_bucket(header.bucket_id, index) {
        Some(range) => format!("Week: {} ({range})", header.bucket_id),
        None => format!("Week: {}", header.bucket_id),
    };

    let mut lines = vec![
        format!("Member: {} (id: {})", header.member_label, header.member_id),
        week,
        "Messages (oldest -> newest)".to_string(),
        CONTEXT_RULE.to_string(),
    ];

    let skip = timeline.len().saturating_sub(CONTEXT_MAX_MESSAGES);
    lines.extend(timeline.iter().skip(skip).map(|record| {
        let when = record
            .timestamp
            .map(|ts| ts.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!("{when} - {}: {}", record.author_name, record.text)
    }));

    let context = lines.join("\n");
    keep_last_chars(&context, CONTEXT_MAX_CHARS).to_string()
}

/// The last `max` characters of `text`, never splitting a UTF-8 sequence.
fn keep_last_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let start = text
        .char_indices()
        .nth(count - max)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &text[start..]
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRole;
    use crate::normalize::ShapeNormalizer;
    use crate::timeline::merge;
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};

    fn config() -> EngineConfig {
        EngineConfig {
            member_display_name: "Rohan Patel".into(),
            team_display_name: "Elyx Team".into(),
            ..EngineConfig::default()
        }
    }

    fn header() -> ChatContextHeader<'static> {
        ChatContextHeader {
            member_label: "Rohan Patel",
            member_id: "rohan",
            bucket_id: "02",
        }
    }

    fn rec(i: usize, text: &str) -> CanonicalRecord {
        CanonicalRecord {
            id: format!("{i:04}"),
            timestamp: DateTime::from_timestamp(1_758_700_800 + i as i64 * 60, 0),
            text: text.to_string(),
            author_role: AuthorRole::Team,
            author_name: "Elyx Team".into(),
            author_id: None,
            raw: Value::Null,
        }
    }

    // ── Member side ──

    #[test]
    fn member_side_by_role_or_sender_name() {
        let config = config();
        let normalizer = ShapeNormalizer::new(&config);
        let records = normalizer.normalize(&json!([
            { "text": "a", "role": "user" },
            { "text": "b", "role": "system", "senderName": "Member" },
            { "text": "c", "role": "coach", "senderName": "Dr. Warren" },
            { "text": "d", "role": "system" },
        ]));
        let sides: Vec<bool> = records.iter().map(|r| is_member_message(r, &config)).collect();
        assert_eq!(sides, vec![true, true, false, false]);
    }

    // ── Context ──

    #[test]
    fn context_has_header_then_lines() {
        let config = config();
        let index = EpochWeekIndex::from_config(&config);
        let normalizer = ShapeNormalizer::new(&config);
        let timeline = merge(
            &normalizer.normalize(&json!({ "messages": [
                { "text": "How did you sleep?", "role": "coach", "createdAt": "2025-09-24T07:30:00Z" },
                { "text": "Badly", "role": "user" },
            ]})),
            &[],
        );

        let context = build_chat_context(&timeline, &header(), &index, &Utc);
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Member: Rohan Patel (id: rohan)",
                "Week: 02 (24 Sep 2025 - 30 Sep 2025)",
                "Messages (oldest -> newest)",
                CONTEXT_RULE,
                "unknown - Rohan Patel: Badly",
                "2025-09-24 07:30 - Elyx Team: How did you sleep?",
            ]
        );
    }

    #[test]
    fn non_numeric_bucket_has_no_range() {
        let index = EpochWeekIndex::from_config(&config());
        let header = ChatContextHeader {
            bucket_id: "drafts",
            ..header()
        };
        let context = build_chat_context(&MergedTimeline::default(), &header, &index, &Utc);
        assert!(context.contains("\nWeek: drafts\n"));
    }

    #[test]
    fn context_keeps_last_200_messages() {
        let index = EpochWeekIndex::from_config(&config());
        let records: Vec<CanonicalRecord> = (0..250).map(|i| rec(i, &format!("msg {i}"))).collect();
        let timeline = merge(&records, &[]);

        let context = build_chat_context(&timeline, &header(), &index, &Utc);
        assert!(!context.contains(": msg 49\n"));
        assert!(context.contains(": msg 50\n"));
        assert!(context.ends_with(": msg 249"));
        assert_eq!(context.lines().count(), 4 + CONTEXT_MAX_MESSAGES);
    }

    #[test]
    fn long_context_keeps_tail_on_char_boundary() {
        let index = EpochWeekIndex::from_config(&config());
        let records: Vec<CanonicalRecord> = (0..120).map(|i| rec(i, &"é".repeat(150))).collect();
        let timeline = merge(&records, &[]);

        let context = build_chat_context(&timeline, &header(), &index, &Utc);
        assert_eq!(context.chars().count(), CONTEXT_MAX_CHARS);
        assert!(!context.starts_with("Member:"));
        assert!(context.ends_with('é'));
    }

    #[test]
    fn keep_last_chars_short_input_untouched() {
        assert_eq!(keep_last_chars("héllo", 10), "héllo");
        assert_eq!(keep_last_chars("héllo", 3), "llo");
        assert_eq!(keep_last_chars("", 3), "");
    }
}

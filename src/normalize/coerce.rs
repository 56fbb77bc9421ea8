//! Field coercers: pure helpers that pull one canonical value out of a
//! loosely-typed payload.
//!
//! Every coercer is total: a value that cannot be read degrades to `None`
//! or an empty string, never an error.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::config::{EngineConfig, RoleRules};
use crate::models::AuthorRole;

/// Sender-name value that stands for "the member" rather than a real name.
pub const MEMBER_PLACEHOLDER: &str = "member";

fn whitespace_re() -> &'static Regex {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Collapse runs of whitespace to one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text.trim(), " ").into_owned()
}

/// Render a scalar as a string. Objects, arrays and null yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First alias whose value is a scalar with non-blank content, trimmed.
pub fn first_non_empty<S: AsRef<str>>(record: &Value, aliases: &[S]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        let value = scalar_to_string(record.get(alias.as_ref())?)?;
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

// ═══════════════════════════════════════════
// Timestamps
// ═══════════════════════════════════════════

/// Coerce one value into an instant.
///
/// Preference order: native store timestamp (`_seconds`/`_nanoseconds` or
/// `timestampValue`), `{seconds, nanoseconds}` object, epoch milliseconds,
/// date string.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    native_timestamp(value)
        .or_else(|| seconds_object(value))
        .or_else(|| epoch_millis(value))
        .or_else(|| value.as_str().and_then(parse_date_string))
}

/// First timestamp alias that coerces.
pub fn coerce_record_timestamp(record: &Value, aliases: &[String]) -> Option<DateTime<Utc>> {
    aliases
        .iter()
        .filter_map(|alias| record.get(alias))
        .find_map(coerce_timestamp)
}

/// Calendar date (UTC) of a date-like value.
pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    coerce_timestamp(value).map(|ts| ts.date_naive())
}

fn native_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let obj = value.as_object()?;
    if let Some(secs) = obj.get("_seconds") {
        let nanos = obj.get("_nanoseconds").and_then(Value::as_u64).unwrap_or(0);
        return from_parts(secs, nanos);
    }
    obj.get("timestampValue")?.as_str().and_then(parse_date_string)
}

fn seconds_object(value: &Value) -> Option<DateTime<Utc>> {
    let obj = value.as_object()?;
    let secs = obj.get("seconds")?;
    let nanos = obj.get("nanoseconds").and_then(Value::as_u64).unwrap_or(0);
    from_parts(secs, nanos)
}

fn from_parts(secs: &Value, nanos: u64) -> Option<DateTime<Utc>> {
    let secs = secs
        .as_i64()
        .or_else(|| secs.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))?;
    let nanos = u32::try_from(nanos).ok().filter(|n| *n < 1_000_000_000)?;
    DateTime::from_timestamp(secs, nanos)
}

fn epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
    let Value::Number(n) = value else {
        return None;
    };
    let millis = n
        .as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?;
    DateTime::from_timestamp_millis(millis)
}

/// Parse the date-string forms the store has been seen to hold.
/// Zone-less forms are read as UTC.
pub fn parse_date_string(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ═══════════════════════════════════════════
// Text, numbers
// ═══════════════════════════════════════════

/// Message body: a nested `{ text }` object wins, then the flat aliases.
pub fn coerce_text(record: &Value, text_aliases: &[String], nested_aliases: &[String]) -> String {
    let nested = nested_aliases.iter().find_map(|alias| {
        let inner = record.get(alias)?.as_object()?.get("text")?;
        let text = collapse_whitespace(&scalar_to_string(inner)?);
        (!text.is_empty()).then_some(text)
    });
    nested
        .or_else(|| first_non_empty(record, text_aliases).map(|t| collapse_whitespace(&t)))
        .unwrap_or_default()
}

/// Numbers and numeric strings; blank strings, booleans and non-finite values are not numbers.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ═══════════════════════════════════════════
// Authorship
// ═══════════════════════════════════════════

/// Map a raw role value into the closed member/team set.
///
/// Exact values win over substrings; among substrings, team wins, so
/// "team member" is team-like.
pub fn resolve_role(raw: &str, rules: &RoleRules) -> AuthorRole {
    let role = raw.trim().to_lowercase();
    if role.is_empty() {
        return AuthorRole::Unknown;
    }
    let equals = |values: &[String]| values.iter().any(|v| v.eq_ignore_ascii_case(&role));
    let contains = |needles: &[String]| {
        needles
            .iter()
            .any(|n| !n.is_empty() && role.contains(&n.to_lowercase()))
    };

    if equals(&rules.member_values) {
        AuthorRole::Member
    } else if equals(&rules.team_values) {
        AuthorRole::Team
    } else if contains(&rules.team_substrings) {
        AuthorRole::Team
    } else if contains(&rules.member_substrings) {
        AuthorRole::Member
    } else {
        AuthorRole::Other(role)
    }
}

pub fn coerce_role(record: &Value, config: &EngineConfig) -> AuthorRole {
    first_non_empty(record, &config.aliases.role)
        .map(|raw| resolve_role(&raw, &config.roles))
        .unwrap_or_default()
}

/// Display name with the member placeholder rewritten and a role-based default.
pub fn coerce_display_name(record: &Value, role: &AuthorRole, config: &EngineConfig) -> String {
    match first_non_empty(record, &config.aliases.display_name) {
        Some(name) if name.eq_ignore_ascii_case(MEMBER_PLACEHOLDER) => {
            config.member_display_name.clone()
        }
        Some(name) => name,
        None if role.is_member() => config.member_display_name.clone(),
        None => config.team_display_name.clone(),
    }
}

pub fn coerce_author_id(record: &Value, config: &EngineConfig) -> Option<String> {
    first_non_empty(record, &config.aliases.author_id)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

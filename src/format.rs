//! Small string/number/date coercion helpers.
//!
//! These mirror the loose coercion rules route handlers rely on: inputs
//! arrive as query/path strings and must degrade predictably instead of
//! erroring. Only [`fhir_date_time`] fails loudly.

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DateTimeError {
    #[error("invalid dateTime \"{0}\"")]
    Invalid(String),
}

/// Trim, then escape `&`, `<`, `>`, `"` for embedding in an HTML fragment.
/// Ampersand goes first so entities produced by the later substitutions are
/// not double-escaped.
pub fn html_encode(input: &str) -> String {
    input
        .trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Replace each `%s` in `template` left-to-right with successive arguments.
/// When arguments run out, remaining `%s` tokens become the empty string.
pub fn printf(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut args = args.iter();

    while let Some(idx) = rest.find("%s") {
        out.push_str(&rest[..idx]);
        out.push_str(args.next().copied().unwrap_or(""));
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

/// Join path segments with `/`, stripping one leading and one trailing slash
/// from each segment first.
pub fn build_url_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| {
            let segment = segment.strip_prefix('/').unwrap_or(segment);
            segment.strip_suffix('/').unwrap_or(segment)
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Loose boolean coercion: false exactly for the trimmed, case-insensitive
/// set `{"0", "no", "false", "off", "null", "undefined", "nan", ""}`.
pub fn to_bool(input: impl ToString) -> bool {
    let s = input.to_string().trim().to_ascii_lowercase();
    !matches!(
        s.as_str(),
        "0" | "no" | "false" | "off" | "null" | "undefined" | "nan" | ""
    )
}

/// Leading-digits integer parse: `"7.9"` is 7, `"12abc"` is 12. Negative or
/// digit-free input is rejected.
fn parse_uint(input: &str) -> Option<u64> {
    let s = input.trim();
    if s.starts_with('-') {
        return None;
    }
    let digits: &str = {
        let end = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        &s[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Coerce to a non-negative integer, 0 when the input does not parse.
pub fn uint(input: impl ToString) -> u64 {
    parse_uint(&input.to_string()).unwrap_or(0)
}

/// Coerce to a non-negative integer, falling back to `default` (itself
/// coerced, bottoming out at 0). Always returns a finite value.
pub fn uint_or(input: impl ToString, default: impl ToString) -> u64 {
    parse_uint(&input.to_string()).unwrap_or_else(|| uint(default))
}

const CANONICAL: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize a FHIR-style date/time into canonical `YYYY-MM-DD HH:MM:SS`.
///
/// - digit-only strings of 9+ characters are an epoch in milliseconds
///   (implementation-defined threshold; anything shorter is a calendar year
///   fragment, anything this long cannot be)
/// - `YYYY`, `YYYY-MM` and `YYYY-MM-DD` are padded to full precision
/// - RFC 3339 input is accepted and rendered in UTC
///
/// chrono validates the calendar, so `"2020-13"` fails like `"not-a-date"`.
pub fn fhir_date_time(input: &str) -> Result<String, DateTimeError> {
    let s = input.trim();
    let invalid = || DateTimeError::Invalid(input.to_string());

    if s.len() >= 9 && s.bytes().all(|b| b.is_ascii_digit()) {
        let ms: i64 = s.parse().map_err(|_| invalid())?;
        let dt = DateTime::from_timestamp_millis(ms).ok_or_else(invalid)?;
        return Ok(dt.format(CANONICAL).to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc().format(CANONICAL).to_string());
    }

    let digits_and_dashes = s.bytes().all(|b| b.is_ascii_digit() || b == b'-');
    let padded = match s.len() {
        4 if digits_and_dashes => format!("{s}-01-01 00:00:00"),
        7 if digits_and_dashes => format!("{s}-01 00:00:00"),
        10 if digits_and_dashes => format!("{s} 00:00:00"),
        _ => s.to_string(),
    };

    NaiveDateTime::parse_from_str(&padded, CANONICAL)
        .map(|dt| dt.format(CANONICAL).to_string())
        .map_err(|_| invalid())
}

//! Lenient date parsing
//!
//! Trip dates arrive as free-form strings from chat. Anything that cannot be
//! parsed is treated as absent by callers, so these functions return Option
//! rather than errors.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const MONTH_FORMATS: &[&str] = &["%Y-%m-%d", "%d %B %Y", "%d %b %Y", "%d/%m/%Y"];

/// Today in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a full calendar date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = normalize(s);
    if s.is_empty() {
        return None;
    }

    // RFC 3339 timestamps and "2026-03-01T..." prefixes
    if s.len() > 10
        && s.is_char_boundary(10)
        && let Ok(date) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d")
    {
        return Some(date);
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok());
    if parsed.is_none() {
        debug!(input = %s, "parse_date: no format matched");
    }
    parsed
}

/// Extract (year, month) from a full date or a month-level string
///
/// Accepts everything `parse_date` does plus "2026-03", "March 2026",
/// "Mar 2026" and "03/2026".
pub fn month_year(s: &str) -> Option<(i32, u32)> {
    if let Some(date) = parse_date(s) {
        return Some((date.year(), date.month()));
    }

    let s = normalize(s);
    let candidates = [
        format!("{}-01", s),
        format!("01 {}", s),
        format!("01/{}", s),
    ];
    candidates
        .iter()
        .flat_map(|c| MONTH_FORMATS.iter().map(move |fmt| (c, fmt)))
        .find_map(|(c, fmt)| NaiveDate::parse_from_str(c, fmt).ok())
        .map(|d| (d.year(), d.month()))
}

/// Days from start to end (negative when end precedes start)
pub fn span_days(start: &str, end: &str) -> Option<i64> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Some((end - start).num_days())
}

/// Month name for display ("March")
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(month.saturating_sub(1) as usize).copied().unwrap_or("?")
}

fn normalize(s: &str) -> String {
    // "March 3rd, 2026" -> "March 3, 2026"
    let trimmed = s.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_digit = false;
    let chars: Vec<char> = trimmed.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if prev_digit && i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect::<String>().to_lowercase();
            let boundary = chars.get(i + 2).is_none_or(|n| !n.is_alphanumeric());
            if boundary && matches!(pair.as_str(), "st" | "nd" | "rd" | "th") {
                i += 2;
                prev_digit = false;
                continue;
            }
        }
        prev_digit = c.is_ascii_digit();
        out.push(c);
        i += 1;
    }
    out
}

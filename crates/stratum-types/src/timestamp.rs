//! Timestamp formats found in repository metadata.
//!
//! Replication markers carry a human-written timestamp on their first line;
//! the whitelist carries compact `YYYYMMDDHHMMSS` stamps. Both normalize to UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::TypeError;

/// Format written by `date` on the publishing host, e.g.
/// `Thu Mar 24 12:34:56 CET 2016`, with the zone name removed.
const MARKER_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Zone abbreviations `date` prints, with their offsets east of UTC in hours.
const ZONE_OFFSETS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("WET", 0),
    ("WEST", 1),
    ("BST", 1),
    ("CET", 1),
    ("CEST", 2),
    ("EET", 2),
    ("EEST", 3),
    ("MSK", 3),
    ("JST", 9),
    ("AEST", 10),
    ("AEDT", 11),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

fn zone_offset(name: &str) -> Option<FixedOffset> {
    ZONE_OFFSETS
        .iter()
        .find(|(zone, _)| zone.eq_ignore_ascii_case(name))
        .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600))
}

/// Compact whitelist stamp.
const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S";

/// The value used when a repository was never replicated.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Parse a marker timestamp in RFC 3339, RFC 2822, or `date` output form.
pub fn parse_marker(input: &str) -> Result<DateTime<Utc>, TypeError> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_date_output(trimmed).ok_or_else(|| TypeError::InvalidTimestamp(trimmed.to_string()))
}

/// `<weekday> <month> <day> <time> <zone> <year>`; unknown zones are rejected.
fn parse_date_output(input: &str) -> Option<DateTime<Utc>> {
    let mut fields: Vec<&str> = input.split_whitespace().collect();
    if fields.len() != 6 {
        return None;
    }
    let offset = zone_offset(fields.remove(4))?;
    let naive = NaiveDateTime::parse_from_str(&fields.join(" "), MARKER_DATE_FORMAT).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Parse a compact `YYYYMMDDHHMMSS` stamp as UTC.
pub fn parse_compact(input: &str) -> Result<DateTime<Utc>, TypeError> {
    let trimmed = input.trim();
    NaiveDateTime::parse_from_str(trimmed, COMPACT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| TypeError::InvalidTimestamp(trimmed.to_string()))
}

/// Render a compact `YYYYMMDDHHMMSS` stamp.
pub fn format_compact(ts: &DateTime<Utc>) -> String {
    ts.format(COMPACT_FORMAT).to_string()
}

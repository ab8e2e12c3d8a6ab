//! Utility functions and helpers

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use std::sync::atomic::{AtomicU32, Ordering};

/// Date format used for record dates and query bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format used for record times
pub const TIME_FORMAT: &str = "%H:%M";

/// Registration timestamp format (`YYYYMMDDHHMMSS`)
pub const REG_DTTM_FORMAT: &str = "%Y%m%d%H%M%S";

static KEY_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate a namespaced storage key such as `record:1718000000000-0003`.
///
/// Keys sort by creation time; the trailing sequence keeps keys generated
/// within the same millisecond distinct.
pub fn generate_key(prefix: &str, now: DateTime<Local>) -> String {
    let seq = KEY_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 10_000;
    format!("{}:{}-{:04}", prefix, now.timestamp_millis(), seq)
}

/// Format a registration timestamp
pub fn format_reg_dttm(now: DateTime<Local>) -> String {
    now.format(REG_DTTM_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Parse an `HH:MM` time of day
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

/// Split free text into whitespace separated query terms
pub fn split_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_key_prefix_and_uniqueness() {
        let now = Local.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let a = generate_key("record", now);
        let b = generate_key("record", now);
        assert!(a.starts_with("record:"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_reg_dttm() {
        let now = Local.with_ymd_and_hms(2024, 6, 15, 10, 30, 5).unwrap();
        assert_eq!(format_reg_dttm(now), "20240615103005");
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(parse_date("2024-02-30").is_none());
        assert!(parse_date("15/06/2024").is_none());
        assert_eq!(parse_time("09:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn test_split_terms() {
        assert_eq!(split_terms("  coffee  card "), vec!["coffee", "card"]);
        assert!(split_terms("   ").is_empty());
    }
}

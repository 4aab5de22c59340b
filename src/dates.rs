use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::DateError;

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
// `%B` also accepts abbreviated month names when parsing.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y"];

/// Parses a frontmatter date. Values without an offset are taken as UTC.
pub fn parse_post_date(value: &str) -> Result<DateTime<Utc>, DateError> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    Err(DateError::Unparseable(value.to_string()))
}

/// `Fri, 01 Mar 2024 00:00:00 GMT`
pub fn format_rss_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `March 1, 2024`
pub fn format_long_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

//! Date parsing for survey date columns.

use bramm_types::value::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a date from the textual forms found in survey exports.
///
/// # Examples
///
/// ```
/// use bramm::compute::temporal::parse_date;
///
/// assert!(parse_date("2006-07-14").is_some());
/// assert!(parse_date("14/07/2006").is_some());
/// assert!(parse_date("2006-07-14T09:30:00").is_some());
/// assert!(parse_date("summer 2006").is_none());
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Date held by a cell, parsing text when needed.
pub fn date_of(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date(s),
        _ => None,
    }
}

/// Calendar year held by a cell, `None` if missing or unparseable.
pub fn year_of(value: &Value) -> Option<i32> {
    date_of(value).map(|d| d.year())
}

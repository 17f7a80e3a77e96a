use super::types::CellValue;
use calamine::Data;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Serial day number of 9999-12-31, the last date a workbook can hold.
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// A rule that claims a text cell, or passes it on to the next rule.
pub type TextRule = fn(&str) -> Option<CellValue>;

/// Text cells are offered to these rules in order; the first claim wins and
/// unclaimed text stays a string.
pub const TEXT_RULES: [(&str, TextRule); 3] = [
    ("boolean", parse_boolean_literal),
    ("numeric", parse_numeric),
    ("date", parse_date_shaped),
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%a, %d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Decodes one cell as it is stored. Text is kept verbatim; only the empty
/// string collapses to null.
pub fn decode(raw: &Data) -> CellValue {
    match raw {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Str(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if dt.is_duration() || !(0.0..=MAX_SERIAL_DAY).contains(&serial) {
                return CellValue::Number(serial);
            }
            dt.as_datetime()
                .map(CellValue::Date)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Str(s.clone())),
        Data::DurationIso(s) => CellValue::Str(s.clone()),
        Data::Error(e) => CellValue::Str(e.to_string()),
    }
}

/// Coerces one decoded cell into the value it stands for. Never fails:
/// anything that cannot be interpreted keeps its string form.
pub fn normalize(raw: &Data) -> CellValue {
    match raw {
        Data::String(s) => normalize_text(s),
        other => decode(other),
    }
}

/// [`normalize`] applied to an already decoded cell.
pub fn normalize_value(value: &CellValue) -> CellValue {
    match value {
        CellValue::Str(s) => normalize_text(s),
        other => other.clone(),
    }
}

pub fn normalize_text(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }

    TEXT_RULES
        .iter()
        .find_map(|(_, rule)| rule(s))
        .unwrap_or_else(|| CellValue::Str(s.to_string()))
}

pub fn parse_boolean_literal(s: &str) -> Option<CellValue> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(CellValue::Bool(true))
    } else if s.eq_ignore_ascii_case("false") {
        Some(CellValue::Bool(false))
    } else {
        None
    }
}

pub fn parse_numeric(s: &str) -> Option<CellValue> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(CellValue::Number)
}

/// Dates are only recognized when the text carries a separator or a letter,
/// so bare digit runs such as `20231225` never read as dates.
pub fn parse_date_shaped(s: &str) -> Option<CellValue> {
    if !has_date_shape(s) {
        return None;
    }
    parse_date_text(s).map(CellValue::Date)
}

pub fn has_date_shape(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '-' | '/' | ',') || c.is_ascii_alphabetic())
}

pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

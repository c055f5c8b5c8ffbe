use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

use super::static_regex;

static TIMESTAMP: OnceLock<Regex> = OnceLock::new();

// Date in Y-M-D or D-M-Y/M-D-Y order, optionally followed by a clock time.
const TIMESTAMP_PATTERN: &str = r"(?ix)
    \b
    (?:
        (?P<iso_y>\d{4})[-/.](?P<iso_m>\d{1,2})[-/.](?P<iso_d>\d{1,2})
      | (?P<first>\d{1,2})[-/.](?P<second>\d{1,2})[-/.](?P<year>\d{4})
    )
    (?:
        (?:\s*[T,]\s*|\s+)
        (?P<hour>\d{1,2}):(?P<minute>\d{2})
        (?::(?P<sec>\d{2})(?:\.(?P<frac>\d{1,9}))?)?
        (?:\s*(?P<meridiem>[ap])\.?m\b\.?)?
    )?
";

fn timestamp_regex() -> &'static Regex {
    static_regex(&TIMESTAMP, TIMESTAMP_PATTERN)
}

/// Every date-time embedded in `text`, in textual order. Unparseable candidates are skipped.
pub fn extract_timestamps(text: &str) -> Vec<NaiveDateTime> {
    locate_timestamps(text).into_iter().map(|(_, value)| value).collect()
}

/// Byte offset of each embedded date-time alongside its parsed value.
pub(crate) fn locate_timestamps(text: &str) -> Vec<(usize, NaiveDateTime)> {
    timestamp_regex()
        .captures_iter(text)
        .filter(|caps| caps.name("hour").is_some())
        .filter_map(|caps| {
            let start = caps.get(0).map(|m| m.start())?;
            interpret(&caps).map(|value| (start, value))
        })
        .collect()
}

/// Parses a standalone cell value such as `Opened`: RFC 3339, any embedded format, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    let caps = timestamp_regex().captures(trimmed)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != trimmed.len() {
        return None;
    }

    interpret(&caps)
}

fn interpret(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let date = match (caps.name("iso_y"), caps.name("year")) {
        (Some(year), _) => NaiveDate::from_ymd_opt(
            number(year.as_str())? as i32,
            number(caps.name("iso_m")?.as_str())?,
            number(caps.name("iso_d")?.as_str())?,
        )?,
        (None, Some(year)) => {
            let year = number(year.as_str())? as i32;
            let first = number(caps.name("first")?.as_str())?;
            let second = number(caps.name("second")?.as_str())?;
            // Day-first wins when both readings are valid calendar dates.
            NaiveDate::from_ymd_opt(year, second, first)
                .or_else(|| NaiveDate::from_ymd_opt(year, first, second))?
        }
        (None, None) => return None,
    };

    let Some(hour) = caps.name("hour") else {
        return date.and_hms_opt(0, 0, 0);
    };

    let hour = adjust_meridiem(
        number(hour.as_str())?,
        caps.name("meridiem").map(|m| m.as_str()),
    )?;
    let minute = number(caps.name("minute")?.as_str())?;
    let second = caps
        .name("sec")
        .map(|m| number(m.as_str()))
        .unwrap_or(Some(0))?;
    let nanos = caps.name("frac").map(|m| fraction_nanos(m.as_str())).unwrap_or(0);

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    Some(date.and_time(time))
}

fn adjust_meridiem(hour: u32, meridiem: Option<&str>) -> Option<u32> {
    match meridiem.map(|m| m.to_ascii_lowercase()) {
        None => Some(hour),
        Some(_) if hour == 0 || hour > 12 => None,
        Some(m) if m == "p" => Some(hour % 12 + 12),
        Some(_) => Some(hour % 12),
    }
}

fn fraction_nanos(digits: &str) -> u32 {
    let padded = format!("{digits:0<9}");
    padded[..9].parse().unwrap_or(0)
}

fn number(value: &str) -> Option<u32> {
    value.parse().ok()
}

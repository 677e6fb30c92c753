//! Date helper functions
//!
//! Dates are displayed with Brazilian Portuguese conventions:
//! `25 mar 2021`, or `25 mar 2021 às 14:30` with the time.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Abbreviated pt-BR month names
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Shown in place of a date that cannot be parsed
pub const PLACEHOLDER: &str = "-";

/// Formats backend timestamps for display in a fixed time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormatter {
    tz: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl DateFormatter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build from an IANA zone name; an empty name means UTC
    pub fn from_name(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Ok(Self::default());
        }
        let tz: Tz = name
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone: {}", name)))?;
        Ok(Self { tz })
    }

    /// Format a timestamp as `dd MMM yyyy`, optionally followed by ` às HH:mm`
    ///
    /// # Examples
    /// ```ignore
    /// formatter.format("2021-03-25T14:30:00Z", true) // -> "25 mar 2021 às 14:30"
    /// ```
    pub fn format(&self, ts: &str, include_time: bool) -> Result<String> {
        let date = parse_timestamp(ts)?.with_timezone(&self.tz);
        let month = MONTHS_PT_BR[date.month0() as usize];
        let mut out = format!("{} {} {}", date.format("%d"), month, date.format("%Y"));
        if include_time {
            out.push_str(&date.format(" às %H:%M").to_string());
        }
        Ok(out)
    }

    /// Like [`format`](Self::format), substituting [`PLACEHOLDER`] on failure
    pub fn format_or_placeholder(&self, ts: Option<&str>, include_time: bool) -> String {
        match ts.map(|ts| self.format(ts, include_time)) {
            Some(Ok(formatted)) => formatted,
            Some(Err(e)) => {
                tracing::warn!("{}", e);
                PLACEHOLDER.to_string()
            }
            None => PLACEHOLDER.to_string(),
        }
    }

    /// The "edited on" note shown when an article was republished
    pub fn edited_note(&self, first: Option<&str>, last: Option<&str>) -> Option<String> {
        if first == last {
            return None;
        }
        let last = last?;
        Some(format!(
            "* editado em {}",
            self.format_or_placeholder(Some(last), true)
        ))
    }
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339 (`2021-03-25T14:30:00Z`), offsets without a colon as
/// the CMS sends them (`2021-03-25T14:30:00+0000`) and bare dates.
pub fn parse_timestamp(ts: &str) -> Result<DateTime<FixedOffset>> {
    let ts = ts.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(ts) {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(date) = DateTime::parse_from_str(ts, format) {
            return Ok(date);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(ts, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight).into());
        }
    }
    Err(Error::InvalidTimestamp(ts.to_string()))
}

/// Format a timestamp in UTC
pub fn format_date(ts: &str, include_time: bool) -> Result<String> {
    DateFormatter::default().format(ts, include_time)
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Zone: TimeZone>(date: &DateTime<Zone>) -> String
where
    Zone::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Generate a <time> HTML element, or the placeholder for a bad timestamp
pub fn time_tag(formatter: &DateFormatter, ts: Option<&str>) -> String {
    match ts.map(parse_timestamp) {
        Some(Ok(date)) => format!(
            r#"<time datetime="{}">{}</time>"#,
            date_xml(&date),
            formatter.format_or_placeholder(ts, false)
        ),
        _ => PLACEHOLDER.to_string(),
    }
}

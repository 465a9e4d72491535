//! Time zone handling for history dates
//!
//! A history point belongs to the calendar day on which it was fetched. Which
//! day that is depends on the zone: the machine's local zone unless the
//! configuration names one.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// Zone used to decide the calendar date of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// The machine's local time zone
    #[default]
    Local,
    /// A named IANA zone such as `Europe/Paris`
    Named(Tz),
    /// A fixed UTC offset such as `+01:00`
    Fixed(FixedOffset),
}

impl CalendarZone {
    /// Parse a zone from configuration; `None` or an empty string means local
    pub fn from_config(tz_str: Option<&str>) -> Result<Self, String> {
        match tz_str.map(str::trim) {
            None | Some("") => Ok(Self::Local),
            Some(s) => parse_zone(s),
        }
    }

    /// Calendar date of the given instant in this zone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Today's calendar date in this zone
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

fn parse_zone(tz_str: &str) -> Result<CalendarZone, String> {
    if let Ok(tz) = tz_str.parse::<Tz>() {
        return Ok(CalendarZone::Named(tz));
    }

    if let Ok(offset) = parse_fixed_offset(tz_str) {
        return Ok(CalendarZone::Fixed(offset));
    }

    Err(format!("Invalid timezone: '{}'. Use either a named timezone (e.g., 'Europe/London') or UTC offset (e.g., '+01:00')", tz_str))
}

/// Parse fixed offset timezone formats like "+01:00", "+0100", etc.
fn parse_fixed_offset(offset_str: &str) -> Result<FixedOffset, String> {
    let offset_str = offset_str.trim();

    // Handle formats like +01:00, -05:30, +0100, -0530
    let re = Regex::new(r"^([+-])(\d{2}):?(\d{2})$").map_err(|e| format!("Regex error: {}", e))?;

    let caps = re
        .captures(offset_str)
        .ok_or_else(|| format!("Invalid offset format: '{}'", offset_str))?;

    let sign = if &caps[1] == "+" { 1 } else { -1 };
    let hours: i32 = caps[2].parse().map_err(|_| "Invalid hours in offset")?;
    let minutes: i32 = caps[3].parse().map_err(|_| "Invalid minutes in offset")?;

    if hours > 23 || minutes > 59 {
        return Err("Invalid time values in offset".to_string());
    }

    let total_seconds = sign * (hours * 3600 + minutes * 60);

    FixedOffset::east_opt(total_seconds).ok_or_else(|| "Invalid timezone offset".to_string())
}

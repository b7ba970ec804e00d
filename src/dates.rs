// 📅 Date Normalizer
// Tolerant calendar-date parsing: anything unrecognised becomes "absent", never an error

use crate::error::{AuditError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Unambiguous year-first layouts, tried before anything else
const YEAR_FIRST: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const MONTH_FIRST: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y"];

const DAY_FIRST: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Two-digit years: 00-69 land in the 2000s, 70-99 in the 1900s
const MONTH_FIRST_SHORT: &[&str] = &["%m/%d/%y", "%m-%d-%y", "%m.%d.%y"];

const DAY_FIRST_SHORT: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// `%Y` accepts 1-4 digits; anything earlier is a short year read as a full one
const MIN_YEAR: i32 = 1000;

/// Datetime layouts; the time part is dropped
const DATETIME: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const MONTH_FIRST_DATETIME: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];

const DAY_FIRST_DATETIME: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer {
    /// Prefer day/month/year over month/day/year for ambiguous input
    pub day_first: bool,
}

impl DateNormalizer {
    pub fn new(day_first: bool) -> Self {
        DateNormalizer { day_first }
    }

    /// Normalise a raw cell into a calendar date, or `None` if blank or unrecognised
    pub fn normalize(&self, raw: &str) -> Option<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        let (preferred, fallback) = if self.day_first {
            (DAY_FIRST, MONTH_FIRST)
        } else {
            (MONTH_FIRST, DAY_FIRST)
        };

        for fmt in YEAR_FIRST.iter().chain(preferred).chain(fallback) {
            if let Some(date) = parse_full_year(value, fmt) {
                return Some(date);
            }
        }

        let (preferred_short, fallback_short) = if self.day_first {
            (DAY_FIRST_SHORT, MONTH_FIRST_SHORT)
        } else {
            (MONTH_FIRST_SHORT, DAY_FIRST_SHORT)
        };

        for fmt in preferred_short.iter().chain(fallback_short) {
            if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
                return Some(date);
            }
        }

        let (preferred_dt, fallback_dt) = if self.day_first {
            (DAY_FIRST_DATETIME, MONTH_FIRST_DATETIME)
        } else {
            (MONTH_FIRST_DATETIME, DAY_FIRST_DATETIME)
        };

        for fmt in DATETIME.iter().chain(preferred_dt).chain(fallback_dt) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                if dt.year() >= MIN_YEAR {
                    return Some(dt.date());
                }
            }
        }

        // Offsets are ignored: the calendar date as written is kept
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive())
    }
}

fn parse_full_year(value: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, fmt)
        .ok()
        .filter(|date| date.year() >= MIN_YEAR)
}

/// Parse the run's reference date; unlike cell values, failure here is fatal
pub fn parse_audit_date(raw: &str, day_first: bool) -> Result<NaiveDate> {
    DateNormalizer::new(day_first)
        .normalize(raw)
        .ok_or_else(|| AuditError::InvalidAuditDate(raw.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

//! World clock parsing and elapsed-time computation.
//!
//! The document's clock is free text written by the narrative engine:
//! a date such as `"末日纪元，2184年3月1日"` and a time such as
//! `"深夜 - 23:50"`. Only the `<Y>年<M>月<D>日` and `HH:MM` fragments matter.
//!
//! Elapsed time is only ever reported when the clock moved strictly forward.
//! A clock that fails to parse, stands still or runs backwards yields `None`,
//! which callers treat as "do not settle this round", never as zero hours.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema;
use crate::value::{as_text, get_in};

const MINUTES_PER_DAY: i64 = 24 * 60;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,4})年(\d{1,2})月(\d{1,2})日").expect("date pattern is valid"))
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("time pattern is valid"))
}

/// The raw clock fields of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    /// Date text.
    pub date: String,
    /// Time text.
    pub time: String,
}

impl WorldClock {
    /// Creates a clock from its two text fields.
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// Reads `世界.日期` / `世界.时间` from a document; missing fields are empty.
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        Self {
            date: as_text(get_in(doc, &[schema::WORLD, schema::WORLD_DATE])),
            time: as_text(get_in(doc, &[schema::WORLD, schema::WORLD_TIME])),
        }
    }

    /// Parses both fields into an absolute reading.
    #[must_use]
    pub fn parse(&self) -> Option<ClockReading> {
        Some(ClockReading {
            date: parse_date(&self.date)?,
            time: TimeOfDay::parse(&self.time)?,
        })
    }
}

impl fmt::Display for WorldClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

/// Hour and minute of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    /// Hour, 0..=23.
    pub hour: u32,
    /// Minute, 0..=59.
    pub minute: u32,
}

impl TimeOfDay {
    /// Extracts the first `HH:MM` fragment; out-of-range values are rejected.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = time_pattern().captures(text)?;
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes(&self) -> i64 {
        (self.hour * 60 + self.minute) as i64
    }
}

/// A fully parsed clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    /// Calendar date.
    pub date: NaiveDate,
    /// Time of day.
    pub time: TimeOfDay,
}

impl ClockReading {
    /// Absolute minute count on a common epoch.
    #[must_use]
    pub fn epoch_minutes(&self) -> i64 {
        i64::from(self.date.num_days_from_ce()) * MINUTES_PER_DAY + self.time.minutes()
    }
}

/// Extracts the `<Y>年<M>月<D>日` fragment as a calendar date.
///
/// Dates that do not exist on the calendar (e.g. 2月30日) are rejected.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = date_pattern().captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Hours elapsed between two clocks, or `None` when unknown.
///
/// Unknown covers: either clock unparseable, or the new clock not strictly
/// after the old one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_hours(old: &WorldClock, new: &WorldClock) -> Option<f64> {
    let old = old.parse()?;
    let new = new.parse()?;
    let diff = new.epoch_minutes() - old.epoch_minutes();
    if diff <= 0 {
        return None;
    }
    Some(diff as f64 / 60.0)
}

/// Rewrites a date text to the following calendar day, keeping any text
/// around the date fragment.
#[must_use]
pub fn next_day_text(text: &str) -> Option<String> {
    let m = date_pattern().find(text)?;
    let next = parse_date(m.as_str())?.checked_add_days(Days::new(1))?;
    Some(format!(
        "{}{}年{}月{}日{}",
        &text[..m.start()],
        next.year(),
        next.month(),
        next.day(),
        &text[m.end()..]
    ))
}

/// Detects a midnight crossing the narrative engine forgot to date.
///
/// Returns the patched date text when the time moved backwards across
/// midnight (`23:40 -> 01:10`) while the date text stayed identical.
#[must_use]
pub fn missed_midnight(old: &WorldClock, new: &WorldClock) -> Option<String> {
    if old.time == new.time || old.date != new.date {
        return None;
    }
    let before = TimeOfDay::parse(&old.time)?;
    let after = TimeOfDay::parse(&new.time)?;
    if before <= after {
        return None;
    }
    next_day_text(&old.date)
}

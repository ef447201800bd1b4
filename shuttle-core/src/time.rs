//! Time-of-day arithmetic on minute offsets since midnight.

use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parses `"h:mm AM"` / `"h:mm PM"` (or bare 24-hour `"HH:MM"`) into minutes since midnight.
///
/// Empty or malformed input yields 0 instead of an error so that sorting and
/// display code never has to deal with a failure.
pub fn parse_to_minutes(text: &str) -> i32 {
    parse_clock(text).unwrap_or(0)
}

/// Strict variant of [`parse_to_minutes`] used when validating catalog input.
pub fn parse_clock(text: &str) -> Option<i32> {
    let upper = text.trim().to_ascii_uppercase();

    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (hours, minutes) = clock.split_once(':')?;
    if minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }

    let hours = match meridiem {
        Some(is_pm) => {
            if !(1..=12).contains(&hours) {
                return None;
            }
            (hours % 12) + if is_pm { 12 } else { 0 }
        }
        None => {
            if !(0..24).contains(&hours) {
                return None;
            }
            hours
        }
    };

    Some(hours * 60 + minutes)
}

/// Half-open `[start, end)` interval in minutes. An end earlier than the start
/// is treated as crossing midnight and shifted forward by one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i32,
    pub end: i32,
}

impl TimeWindow {
    pub fn new(start: i32, end: i32) -> Self {
        let end = if end < start { end + MINUTES_PER_DAY } else { end };
        Self { start, end }
    }

    pub fn from_text(departure: &str, arrival: &str) -> Self {
        Self::new(parse_to_minutes(departure), parse_to_minutes(arrival))
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration(&self) -> i32 {
        self.end - self.start
    }
}

/// `startA < endB && endA > startB`, after midnight rollover on both intervals.
pub fn overlap(start_a: i32, end_a: i32, start_b: i32, end_b: i32) -> bool {
    TimeWindow::new(start_a, end_a).overlaps(&TimeWindow::new(start_b, end_b))
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Weekday tag used by the weekly timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayTag {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

pub type OperatingDays = BTreeSet<DayTag>;

impl DayTag {
    pub const ALL: [DayTag; 7] = [
        DayTag::Mon,
        DayTag::Tue,
        DayTag::Wed,
        DayTag::Thu,
        DayTag::Fri,
        DayTag::Sat,
        DayTag::Sun,
    ];

    pub fn from_weekday(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => DayTag::Mon,
            chrono::Weekday::Tue => DayTag::Tue,
            chrono::Weekday::Wed => DayTag::Wed,
            chrono::Weekday::Thu => DayTag::Thu,
            chrono::Weekday::Fri => DayTag::Fri,
            chrono::Weekday::Sat => DayTag::Sat,
            chrono::Weekday::Sun => DayTag::Sun,
        }
    }

    pub fn of(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self::from_weekday(date.weekday())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayTag::Mon => "Mon",
            DayTag::Tue => "Tue",
            DayTag::Wed => "Wed",
            DayTag::Thu => "Thu",
            DayTag::Fri => "Fri",
            DayTag::Sat => "Sat",
            DayTag::Sun => "Sun",
        }
    }
}

impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown weekday tag: {0}")]
pub struct UnknownDayTag(pub String);

impl FromStr for DayTag {
    type Err = UnknownDayTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(DayTag::Mon),
            "tue" | "tues" | "tuesday" => Ok(DayTag::Tue),
            "wed" | "wednesday" => Ok(DayTag::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Ok(DayTag::Thu),
            "fri" | "friday" => Ok(DayTag::Fri),
            "sat" | "saturday" => Ok(DayTag::Sat),
            "sun" | "sunday" => Ok(DayTag::Sun),
            _ => Err(UnknownDayTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for DayTag {
    type Error = UnknownDayTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayTag> for String {
    fn from(tag: DayTag) -> Self {
        tag.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_day_tag_parsing() {
        assert_eq!("Mon".parse::<DayTag>().unwrap(), DayTag::Mon);
        assert_eq!("thursday".parse::<DayTag>().unwrap(), DayTag::Thu);
        assert_eq!(" SUN ".parse::<DayTag>().unwrap(), DayTag::Sun);
        assert!("Funday".parse::<DayTag>().is_err());
    }

    #[test]
    fn test_day_tag_serde() {
        let days: OperatingDays = serde_json::from_str(r#"["Tue", "Monday", "Mon"]"#).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(serde_json::to_string(&days).unwrap(), r#"["Mon","Tue"]"#);
    }

    #[test]
    fn test_day_of_date() {
        // 2026-10-19 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(DayTag::of(monday), DayTag::Mon);
        assert_eq!(DayTag::of(monday.succ_opt().unwrap()), DayTag::Tue);
    }
}

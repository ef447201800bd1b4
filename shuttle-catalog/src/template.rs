use serde::{Deserialize, Serialize};
use shuttle_core::{OperatingDays, TripKey, TripSchedule};

/// One recurring service in the weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTemplate {
    pub bus_number: String,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub driver: String,
    #[serde(rename = "days")]
    pub operating_days: OperatingDays,
    /// Falls back to the configured default seat count when absent.
    #[serde(default, rename = "seats")]
    pub seat_count: Option<i32>,
}

impl TripTemplate {
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }

    pub fn key(&self) -> TripKey {
        TripKey {
            bus_number: self.bus_number.clone(),
            departure_time: self.departure_time.clone(),
        }
    }

    pub fn seats_or(&self, default_seat_count: i32) -> i32 {
        self.seat_count.unwrap_or(default_seat_count)
    }

    pub fn schedule(&self) -> TripSchedule {
        TripSchedule {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            route: self.route(),
            departure_time: self.departure_time.clone(),
            arrival_time: self.arrival_time.clone(),
            operating_days: self.operating_days.clone(),
        }
    }
}

/// Read-only timetable row served to students.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRow {
    pub bus_number: String,
    pub route: String,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub days: OperatingDays,
}

impl From<&TripTemplate> for TimetableRow {
    fn from(t: &TripTemplate) -> Self {
        Self {
            bus_number: t.bus_number.clone(),
            route: t.route(),
            from: t.origin.clone(),
            to: t.destination.clone(),
            departure_time: t.departure_time.clone(),
            arrival_time: t.arrival_time.clone(),
            days: t.operating_days.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::DayTag;

    #[test]
    fn test_template_deserialization() {
        let json = r#"
            {
                "busNumber": "RJ14-PA-1234",
                "from": "LNMIIT",
                "to": "Raja Park",
                "departureTime": "08:00 AM",
                "arrivalTime": "09:00 AM",
                "driver": "Ramesh",
                "days": ["Mon", "Wednesday", "Fri"]
            }
        "#;
        let template: TripTemplate = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(template.bus_number, "RJ14-PA-1234");
        assert_eq!(template.route(), "LNMIIT → Raja Park");
        assert!(template.operating_days.contains(&DayTag::Wed));
        assert_eq!(template.seat_count, None);
        assert_eq!(template.seats_or(40), 40);
    }
}

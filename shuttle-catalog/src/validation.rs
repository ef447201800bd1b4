use shuttle_core::time::parse_clock;
use shuttle_core::TimeWindow;

use crate::template::{TimetableRow, TripTemplate};
use crate::{CatalogError, CatalogResult};

/// Rejects templates that cannot be materialized, and any two templates of the
/// same bus whose windows overlap on a shared operating day.
pub fn validate_catalog(templates: &[TripTemplate]) -> CatalogResult<()> {
    let mut windows = Vec::with_capacity(templates.len());

    for t in templates {
        let invalid = |reason: &str| CatalogError::InvalidTemplate {
            bus_number: t.bus_number.clone(),
            reason: reason.to_string(),
        };

        if t.bus_number.trim().is_empty() {
            return Err(invalid("bus number is empty"));
        }
        let departure = parse_clock(&t.departure_time).ok_or_else(|| invalid("unreadable departure time"))?;
        let arrival = parse_clock(&t.arrival_time).ok_or_else(|| invalid("unreadable arrival time"))?;
        if t.operating_days.is_empty() {
            return Err(invalid("no operating days"));
        }
        if t.seat_count.is_some_and(|seats| seats <= 0) {
            return Err(invalid("seat count must be positive"));
        }

        windows.push(TimeWindow::new(departure, arrival));
    }

    for (i, a) in templates.iter().enumerate() {
        for (j, b) in templates.iter().enumerate().skip(i + 1) {
            if a.bus_number != b.bus_number || a.operating_days.is_disjoint(&b.operating_days) {
                continue;
            }
            if windows[i].overlaps(&windows[j]) {
                return Err(CatalogError::ScheduleOverlap {
                    bus_number: a.bus_number.clone(),
                    first: format!("{}-{}", a.departure_time, a.arrival_time),
                    second: format!("{}-{}", b.departure_time, b.arrival_time),
                });
            }
        }
    }

    Ok(())
}

/// Timetable view ordered by departure time.
pub fn timetable(templates: &[TripTemplate]) -> Vec<TimetableRow> {
    let mut rows: Vec<(i32, TimetableRow)> = templates
        .iter()
        .map(|t| (shuttle_core::parse_to_minutes(&t.departure_time), TimetableRow::from(t)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.bus_number.cmp(&b.1.bus_number)));
    rows.into_iter().map(|(_, row)| row).collect()
}

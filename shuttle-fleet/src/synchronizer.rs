//! Planning half of the fleet synchronizer: a pure function from the timetable
//! and the stored trip instances to the mutations that reconcile them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shuttle_catalog::TripTemplate;
use shuttle_core::{DayTag, SyncPlan, TripInstance, TripKey};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// How a deployment materializes the timetable. Pick one per deployment:
/// running both against the same store races on trip identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Upsert every template by (bus number, departure time), prune the rest.
    /// Keeps ids and conductor assignments across cycles.
    #[default]
    UpsertAndPrune,
    /// Replace every scheduled instance with fresh ones for today's weekday.
    DayFiltered,
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStrategy::UpsertAndPrune => f.write_str("upsert_and_prune"),
            SyncStrategy::DayFiltered => f.write_str("day_filtered"),
        }
    }
}

pub fn synchronize_day(
    strategy: SyncStrategy,
    catalog: &[TripTemplate],
    existing: &[TripInstance],
    service_date: NaiveDate,
    default_seat_count: i32,
) -> SyncPlan {
    match strategy {
        SyncStrategy::UpsertAndPrune => upsert_and_prune(catalog, existing, default_seat_count),
        SyncStrategy::DayFiltered => day_filtered(catalog, existing, service_date, default_seat_count),
    }
}

/// Collapses templates sharing a trip identity into one, in first-seen order.
/// The last template's fields win and operating days accumulate.
fn merge_templates<'a>(templates: impl IntoIterator<Item = &'a TripTemplate>) -> Vec<TripTemplate> {
    let mut merged: Vec<TripTemplate> = Vec::new();
    let mut index: HashMap<TripKey, usize> = HashMap::new();

    for t in templates {
        match index.get(&t.key()) {
            Some(&i) => {
                tracing::warn!(
                    bus_number = %t.bus_number,
                    departure_time = %t.departure_time,
                    "Timetable lists the same trip twice; merging entries"
                );
                let mut days = merged[i].operating_days.clone();
                days.extend(t.operating_days.iter().copied());
                merged[i] = t.clone();
                merged[i].operating_days = days;
            }
            None => {
                index.insert(t.key(), merged.len());
                merged.push(t.clone());
            }
        }
    }
    merged
}

fn instance_from(template: &TripTemplate, default_seat_count: i32) -> TripInstance {
    TripInstance::scheduled(
        template.bus_number.clone(),
        template.seats_or(default_seat_count),
        template.driver.clone(),
        template.schedule(),
    )
}

fn upsert_and_prune(catalog: &[TripTemplate], existing: &[TripInstance], default_seat_count: i32) -> SyncPlan {
    let by_key: HashMap<TripKey, &TripInstance> = existing
        .iter()
        .filter_map(|t| t.key().map(|key| (key, t)))
        .collect();

    let mut plan = SyncPlan::default();
    let mut synced: HashSet<uuid::Uuid> = HashSet::new();

    for template in merge_templates(catalog) {
        match by_key.get(&template.key()) {
            Some(current) => {
                synced.insert(current.id);

                let mut updated = (*current).clone();
                updated.driver = template.driver.clone();
                updated.total_seats = template.seats_or(default_seat_count);
                updated.schedule = Some(template.schedule());

                if &updated != *current {
                    plan.upserts.push(updated);
                }
            }
            None => plan.upserts.push(instance_from(&template, default_seat_count)),
        }
    }

    plan.deletions = existing
        .iter()
        .filter(|t| !t.is_placeholder() && !synced.contains(&t.id))
        .map(|t| t.id)
        .collect();

    plan
}

fn day_filtered(
    catalog: &[TripTemplate],
    existing: &[TripInstance],
    service_date: NaiveDate,
    default_seat_count: i32,
) -> SyncPlan {
    let today = DayTag::of(service_date);
    let todays = catalog.iter().filter(|t| t.operating_days.contains(&today));

    SyncPlan {
        upserts: merge_templates(todays)
            .iter()
            .map(|t| instance_from(t, default_seat_count))
            .collect(),
        deletions: existing
            .iter()
            .filter(|t| !t.is_placeholder())
            .map(|t| t.id)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn template(bus: &str, departure: &str, days: &[DayTag]) -> TripTemplate {
        TripTemplate {
            bus_number: bus.to_string(),
            origin: "LNMIIT".to_string(),
            destination: "Raja Park".to_string(),
            departure_time: departure.to_string(),
            arrival_time: "11:00 AM".to_string(),
            driver: "Ramesh".to_string(),
            operating_days: days.iter().copied().collect(),
            seat_count: None,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    /// Applies a plan the way a store would, for planning round-trips.
    fn apply(existing: &[TripInstance], plan: &SyncPlan) -> Vec<TripInstance> {
        let mut trips: Vec<TripInstance> = existing
            .iter()
            .filter(|t| t.is_placeholder() || !plan.deletions.contains(&t.id))
            .cloned()
            .collect();
        for upsert in &plan.upserts {
            match trips.iter_mut().find(|t| t.id == upsert.id) {
                Some(t) => *t = upsert.clone(),
                None => trips.push(upsert.clone()),
            }
        }
        trips
    }

    #[test]
    fn test_upsert_creates_missing_instances() {
        let catalog = vec![template("B1", "08:00 AM", &[DayTag::Mon]), template("B2", "09:00 AM", &[DayTag::Tue])];
        let plan = synchronize_day(SyncStrategy::UpsertAndPrune, &catalog, &[], monday(), 40);

        assert_eq!(plan.upserts.len(), 2);
        assert!(plan.deletions.is_empty());
        assert!(plan.upserts.iter().all(|t| t.total_seats == 40));
        assert_eq!(plan.upserts[0].route(), "LNMIIT → Raja Park");
    }

    #[test]
    fn test_rerun_with_unchanged_catalog_is_a_no_op() {
        let catalog = vec![template("B1", "08:00 AM", &[DayTag::Mon]), template("B2", "09:00 AM", &[DayTag::Mon])];
        let first = synchronize_day(SyncStrategy::UpsertAndPrune, &catalog, &[], monday(), 40);
        let stored = apply(&[], &first);

        let second = synchronize_day(SyncStrategy::UpsertAndPrune, &catalog, &stored, monday(), 40);
        assert!(second.is_empty());
    }

    #[test]
    fn test_update_preserves_id_and_conductor() {
        let catalog = vec![template("B1", "08:00 AM", &[DayTag::Mon])];
        let mut stored = apply(&[], &synchronize_day(SyncStrategy::UpsertAndPrune, &catalog, &[], monday(), 40));
        let conductor = Uuid::new_v4();
        stored[0].conductor_id = Some(conductor);

        let mut edited = catalog.clone();
        edited[0].driver = "Mahesh".to_string();
        edited[0].arrival_time = "11:30 AM".to_string();
        let plan = synchronize_day(SyncStrategy::UpsertAndPrune, &edited, &stored, monday(), 40);

        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].id, stored[0].id);
        assert_eq!(plan.upserts[0].conductor_id, Some(conductor));
        assert_eq!(plan.upserts[0].driver, "Mahesh");
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn test_stale_instances_pruned_but_placeholders_kept() {
        let catalog = vec![template("B1", "08:00 AM", &[DayTag::Mon])];
        let stale = instance_from(&template("B9", "06:00 PM", &[DayTag::Mon]), 40);
        let placeholder = TripInstance::placeholder("B7".to_string(), 40, "Suresh".to_string());
        let existing = vec![stale.clone(), placeholder.clone()];

        for strategy in [SyncStrategy::UpsertAndPrune, SyncStrategy::DayFiltered] {
            let plan = synchronize_day(strategy, &catalog, &existing, monday(), 40);
            assert_eq!(plan.deletions, vec![stale.id], "strategy {}", strategy);
        }

        // Even an empty catalog never removes a placeholder
        let plan = synchronize_day(SyncStrategy::UpsertAndPrune, &[], &existing, monday(), 40);
        assert!(!plan.deletions.contains(&placeholder.id));
    }

    #[test]
    fn test_duplicate_identities_merge_operating_days() {
        let catalog = vec![
            template("B1", "08:00 AM", &[DayTag::Mon]),
            template("B1", "08:00 AM", &[DayTag::Sat]),
        ];
        let plan = synchronize_day(SyncStrategy::UpsertAndPrune, &catalog, &[], monday(), 40);

        assert_eq!(plan.upserts.len(), 1);
        let days = &plan.upserts[0].schedule.as_ref().unwrap().operating_days;
        assert!(days.contains(&DayTag::Mon) && days.contains(&DayTag::Sat));
    }

    #[test]
    fn test_day_filtered_round_trip_across_days() {
        let catalog = vec![template("B1", "08:00 AM", &[DayTag::Mon])];

        let on_monday = synchronize_day(SyncStrategy::DayFiltered, &catalog, &[], monday(), 40);
        let stored = apply(&[], &on_monday);
        assert_eq!(stored.len(), 1);

        let tuesday = monday().succ_opt().unwrap();
        let on_tuesday = synchronize_day(SyncStrategy::DayFiltered, &catalog, &stored, tuesday, 40);
        let stored = apply(&stored, &on_tuesday);
        assert!(stored.is_empty());
    }

    #[test]
    fn test_template_seat_count_overrides_default() {
        let mut t = template("B1", "08:00 AM", &[DayTag::Mon]);
        t.seat_count = Some(28);
        let plan = synchronize_day(SyncStrategy::UpsertAndPrune, &[t], &[], monday(), 40);
        assert_eq!(plan.upserts[0].total_seats, 28);
    }
}

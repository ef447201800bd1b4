use crate::{FleetError, FleetResult};
use serde::Deserialize;
use shuttle_core::error::constraints;
use shuttle_core::time::parse_clock;
use shuttle_core::{OperatingDays, Role, TripInstance, TripRepository, TripSchedule, UserRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub bus_number: String,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub driver: String,
    pub total_seats: i32,
    #[serde(default, rename = "days")]
    pub operating_days: OperatingDays,
    #[serde(default)]
    pub conductor_id: Option<Uuid>,
}

/// Manual fleet management outside the timetable.
pub struct FleetManager {
    trips: Arc<dyn TripRepository>,
    users: Arc<dyn UserRepository>,
}

impl FleetManager {
    pub fn new(trips: Arc<dyn TripRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { trips, users }
    }

    /// Registers a bus with no schedule. Synchronization never touches it.
    pub async fn add_placeholder(&self, bus_number: &str, total_seats: i32, driver: &str) -> FleetResult<TripInstance> {
        if bus_number.trim().is_empty() {
            return Err(FleetError::Invalid("bus number is required".to_string()));
        }
        if total_seats <= 0 {
            return Err(FleetError::Invalid("total seats must be positive".to_string()));
        }

        let trip = TripInstance::placeholder(bus_number.trim().to_string(), total_seats, driver.to_string());
        self.trips.insert_trip(&trip).await?;
        info!(trip_id = %trip.id, bus_number = %trip.bus_number, "Placeholder bus added");
        Ok(trip)
    }

    pub async fn add_trip(&self, new: NewTrip) -> FleetResult<TripInstance> {
        let bus_number = new.bus_number.trim().to_string();
        if bus_number.is_empty() {
            return Err(FleetError::Invalid("bus number is required".to_string()));
        }
        if new.total_seats <= 0 {
            return Err(FleetError::Invalid("total seats must be positive".to_string()));
        }
        if parse_clock(&new.departure_time).is_none() || parse_clock(&new.arrival_time).is_none() {
            return Err(FleetError::Invalid(format!(
                "unreadable times {} - {}",
                new.departure_time, new.arrival_time
            )));
        }
        if let Some(conductor_id) = new.conductor_id {
            self.require_conductor(conductor_id).await?;
        }

        let schedule = TripSchedule {
            route: format!("{} → {}", new.origin, new.destination),
            origin: new.origin,
            destination: new.destination,
            departure_time: new.departure_time,
            arrival_time: new.arrival_time,
            operating_days: new.operating_days,
        };
        let window = schedule.window();

        let existing = self.trips.list_trips().await?;
        for other in existing.iter().filter(|t| t.bus_number == bus_number) {
            let Some(other_schedule) = &other.schedule else { continue };
            if window.overlaps(&other_schedule.window()) {
                return Err(FleetError::ScheduleOverlap {
                    bus_number,
                    existing: format!("{} to {}", other_schedule.departure_time, other_schedule.arrival_time),
                });
            }
        }

        let mut trip = TripInstance::scheduled(bus_number, new.total_seats, new.driver, schedule);
        trip.conductor_id = new.conductor_id;

        match self.trips.insert_trip(&trip).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation_of(constraints::TRIP_IDENTITY) => {
                return Err(FleetError::DuplicateTrip {
                    bus_number: trip.bus_number,
                    departure_time: trip.schedule.map(|s| s.departure_time).unwrap_or_default(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(trip_id = %trip.id, bus_number = %trip.bus_number, route = %trip.route(), "Trip added");
        Ok(trip)
    }

    /// Assigns (or with `None`, clears) the conductor of a trip.
    pub async fn assign_conductor(&self, trip_id: Uuid, conductor_id: Option<Uuid>) -> FleetResult<()> {
        if let Some(conductor_id) = conductor_id {
            self.require_conductor(conductor_id).await?;
        }
        if !self.trips.set_conductor(trip_id, conductor_id).await? {
            return Err(FleetError::TripNotFound(trip_id));
        }
        info!(%trip_id, ?conductor_id, "Conductor assignment updated");
        Ok(())
    }

    async fn require_conductor(&self, user_id: Uuid) -> FleetResult<()> {
        match self.users.get_user(user_id).await? {
            Some(user) if user.role == Role::Conductor => Ok(()),
            _ => Err(FleetError::NotAConductor(user_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::{DayTag, InMemoryStore, User};

    fn new_trip(bus: &str, departure: &str, arrival: &str) -> NewTrip {
        NewTrip {
            bus_number: bus.to_string(),
            origin: "LNMIIT".to_string(),
            destination: "Railway Station".to_string(),
            departure_time: departure.to_string(),
            arrival_time: arrival.to_string(),
            driver: "Ramesh".to_string(),
            total_seats: 35,
            operating_days: [DayTag::Mon].into_iter().collect(),
            conductor_id: None,
        }
    }

    fn manager() -> (Arc<InMemoryStore>, FleetManager) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), FleetManager::new(store.clone(), store))
    }

    #[tokio::test]
    async fn test_add_trip_rejects_overlap_on_same_bus() {
        let (_, fleet) = manager();
        fleet.add_trip(new_trip("B1", "09:00 AM", "10:00 AM")).await.unwrap();

        let err = fleet.add_trip(new_trip("B1", "09:30 AM", "10:30 AM")).await.unwrap_err();
        assert!(matches!(err, FleetError::ScheduleOverlap { .. }));

        // Touching endpoints and other buses are fine
        fleet.add_trip(new_trip("B1", "10:00 AM", "11:00 AM")).await.unwrap();
        fleet.add_trip(new_trip("B2", "09:30 AM", "10:30 AM")).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_trip_validates_input() {
        let (_, fleet) = manager();
        let mut bad = new_trip("B1", "25:00", "10:00 AM");
        assert!(matches!(fleet.add_trip(bad.clone()).await, Err(FleetError::Invalid(_))));
        bad.departure_time = "09:00 AM".to_string();
        bad.total_seats = 0;
        assert!(matches!(fleet.add_trip(bad).await, Err(FleetError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_assign_conductor_requires_role() {
        let (store, fleet) = manager();
        let trip = fleet.add_placeholder("B5", 40, "Suresh").await.unwrap();
        let student = User::new("Asha", "asha@lnmiit.ac.in", Role::Student);
        let conductor = User::new("Vikram", "vikram@lnmiit.ac.in", Role::Conductor);
        store.add_user(student.clone()).await;
        store.add_user(conductor.clone()).await;

        let err = fleet.assign_conductor(trip.id, Some(student.id)).await.unwrap_err();
        assert!(matches!(err, FleetError::NotAConductor(_)));

        fleet.assign_conductor(trip.id, Some(conductor.id)).await.unwrap();
        let stored = store.get_trip(trip.id).await.unwrap().unwrap();
        assert_eq!(stored.conductor_id, Some(conductor.id));

        let missing = Uuid::new_v4();
        assert!(matches!(
            fleet.assign_conductor(missing, None).await,
            Err(FleetError::TripNotFound(_))
        ));
    }
}

use shuttle_booking::{AllocationEngine, AttendanceDesk, BookingContext, BookingViews, HoldTracker};
use shuttle_catalog::CatalogSource;
use shuttle_core::Clock;
use shuttle_fleet::{FleetManager, FleetSynchronizer};
use shuttle_store::{EventProducer, RedisClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct FleetEvents {
    pub producer: Arc<EventProducer>,
    pub topic: String,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AllocationEngine>,
    pub attendance: Arc<AttendanceDesk>,
    pub holds: Arc<HoldTracker>,
    pub views: Arc<BookingViews>,
    pub fleet: Arc<FleetManager>,
    pub sync: Arc<FleetSynchronizer>,
    pub catalog: Arc<dyn CatalogSource>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthConfig,
    pub rate_limit: Option<RateLimit>,
    pub fleet_events: Option<FleetEvents>,
}

impl AppState {
    pub fn new(
        ctx: BookingContext,
        catalog: Arc<dyn CatalogSource>,
        sync: FleetSynchronizer,
        auth: AuthConfig,
    ) -> Self {
        Self {
            engine: Arc::new(AllocationEngine::new(ctx.clone())),
            attendance: Arc::new(AttendanceDesk::new(ctx.clone())),
            holds: Arc::new(HoldTracker::new(ctx.clone())),
            views: Arc::new(BookingViews::new(ctx.clone())),
            fleet: Arc::new(FleetManager::new(ctx.trips.clone(), ctx.users.clone())),
            sync: Arc::new(sync),
            catalog,
            clock: ctx.clock,
            auth,
            rate_limit: None,
            fleet_events: None,
        }
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, requests_per_minute: i64) -> Self {
        self.rate_limit = Some(RateLimit {
            redis,
            requests_per_minute,
        });
        self
    }

    pub fn with_fleet_events(mut self, producer: Arc<EventProducer>, topic: String) -> Self {
        self.fleet_events = Some(FleetEvents { producer, topic });
        self
    }
}

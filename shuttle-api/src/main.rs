use anyhow::Context;
use shuttle_api::{app, state::AuthConfig, sync, AppState};
use shuttle_booking::{BookingContext, BookingRules};
use shuttle_catalog::{CatalogSource, JsonFileCatalog};
use shuttle_core::clock::{operating_offset, SystemClock};
use shuttle_core::{Clock, InMemoryStore, LogNotifier, Notifier};
use shuttle_fleet::{daily_task, CycleLock, FleetSynchronizer, LocalCycleLock, TaskScheduler, TokioScheduler};
use shuttle_store::app_config::BusinessRules;
use shuttle_store::{
    DbClient, EventProducer, KafkaNotifier, PgBookingRepository, PgTripRepository, PgUserRepository,
    PgWaitlistRepository, RedisClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shuttle_api=debug,shuttle_fleet=info,shuttle_booking=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = shuttle_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting shuttle API on port {}", config.server.port);

    let offset = operating_offset(config.operations.utc_offset_minutes)
        .context("operations.utc_offset_minutes out of range")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).await.context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let producer = if config.kafka.enabled {
        Some(Arc::new(
            EventProducer::new(&config.kafka.brokers).context("Failed to create Kafka producer")?,
        ))
    } else {
        None
    };
    let notifier: Arc<dyn Notifier> = match &producer {
        Some(producer) => Arc::new(KafkaNotifier::new(
            producer.as_ref().clone(),
            config.kafka.notification_topic.clone(),
        )),
        None => Arc::new(LogNotifier),
    };

    let ctx = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            let rules = db
                .fetch_business_rules(config.business_rules.clone())
                .await
                .context("Failed to load business rules")?;
            BookingContext {
                trips: Arc::new(PgTripRepository::new(db.pool.clone())),
                bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
                waitlist: Arc::new(PgWaitlistRepository::new(db.pool.clone())),
                users: Arc::new(PgUserRepository::new(db.pool.clone())),
                notifier,
                clock: clock.clone(),
                rules: booking_rules(&rules),
            }
        }
        None => {
            tracing::warn!("database.url not set; using the in-memory store");
            BookingContext::in_memory(Arc::new(InMemoryStore::new()), notifier, clock.clone())
                .with_rules(booking_rules(&config.business_rules))
        }
    };
    tracing::info!(rules = ?ctx.rules, "Booking rules loaded");

    let catalog: Arc<dyn CatalogSource> = Arc::new(JsonFileCatalog::new(&config.catalog.path));
    let lock: Arc<dyn CycleLock> = match &redis {
        Some(redis) => redis.clone(),
        None => Arc::new(LocalCycleLock::new()),
    };
    let synchronizer = FleetSynchronizer::new(
        catalog.clone(),
        ctx.trips.clone(),
        clock.clone(),
        lock,
        config.operations.sync_strategy,
        config.catalog.default_seat_count,
    )
    .with_lock_ttl(Duration::from_secs(config.operations.sync_lock_seconds));

    let mut state = AppState::new(
        ctx,
        catalog,
        synchronizer,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );
    if let Some(redis) = redis {
        state = state.with_rate_limit(redis, config.rate_limit.requests_per_minute);
    }
    if let Some(producer) = producer {
        state = state.with_fleet_events(producer, config.kafka.fleet_topic.clone());
    }

    sync::bootstrap(&state).await;

    let sync_at = config.operations.sync_time().context("operations.sync_at must be HH:MM")?;
    let task_state = state.clone();
    let task = daily_task(move || {
        let state = task_state.clone();
        async move { sync::run_scheduled(&state).await }
    });
    TokioScheduler.register_daily_task("fleet-sync", sync_at, offset, task);
    tracing::info!(strategy = %config.operations.sync_strategy, %sync_at, "Daily fleet sync scheduled");

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn booking_rules(rules: &BusinessRules) -> BookingRules {
    BookingRules {
        cancellation_cutoff_minutes: rules.cancellation_cutoff_minutes,
        absence_hold_threshold: rules.absence_hold_threshold,
        notification_timeout_seconds: rules.notification_timeout_seconds,
    }
}

pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod redis_repo;
mod rows;
pub mod trip_repo;
pub mod user_repo;
pub mod waitlist_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::{EventProducer, KafkaNotifier};
pub use redis_repo::RedisClient;
pub use trip_repo::PgTripRepository;
pub use user_repo::PgUserRepository;
pub use waitlist_repo::PgWaitlistRepository;

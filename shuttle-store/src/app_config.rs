use chrono::NaiveTime;
use serde::Deserialize;
use shuttle_fleet::SyncStrategy;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    pub operations: OperationsConfig,
    pub business_rules: BusinessRules,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Unset runs against the in-process store.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub notification_topic: String,
    pub fleet_topic: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: String,
    pub default_seat_count: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OperationsConfig {
    /// Minutes east of UTC for every "today" and "now" (330 = Asia/Kolkata).
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub sync_strategy: SyncStrategy,
    pub sync_at: String,
    pub sync_lock_seconds: u64,
}

impl OperationsConfig {
    pub fn sync_time(&self) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(&self.sync_at, "%H:%M")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub cancellation_cutoff_minutes: i32,
    pub absence_hold_threshold: i64,
    pub notification_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: i64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // e.g. SHUTTLE__DATABASE__URL=postgres://...
            .add_source(config::Environment::with_prefix("SHUTTLE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use serde_json::Value;
use tracing::{info, warn};

use crate::app_config::BusinessRules;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlays rules stored as `{"value": ...}` rows in `business_rules` on
    /// top of the configured defaults.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;
        for (key, value) in rows {
            let Some(v) = value.get("value") else {
                warn!(rule = %key, "Business rule row without a value field");
                continue;
            };
            match key.as_str() {
                "cancellation_cutoff_minutes" => {
                    if let Some(n) = v.as_i64().and_then(|n| i32::try_from(n).ok()) {
                        rules.cancellation_cutoff_minutes = n;
                    }
                }
                "absence_hold_threshold" => {
                    if let Some(n) = v.as_i64() {
                        rules.absence_hold_threshold = n;
                    }
                }
                "notification_timeout_seconds" => {
                    if let Some(n) = v.as_u64() {
                        rules.notification_timeout_seconds = n;
                    }
                }
                other => warn!(rule = %other, "Ignoring unknown business rule"),
            }
        }

        Ok(rules)
    }
}

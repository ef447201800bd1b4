use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shuttle_core::repository::UserRepository;
use shuttle_core::{StoreResult, User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::rows::{map_sqlx, UserRow};

const USER_COLUMNS: &str = "id, name, email, role, on_hold, amnesty_date";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(User::try_from).transpose()
    }

    async fn place_on_hold(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET on_hold = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_hold(&self, id: Uuid, amnesty_date: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET on_hold = FALSE, amnesty_date = $2 WHERE id = $1")
            .bind(id)
            .bind(amnesty_date)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_on_hold(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE on_hold ORDER BY name",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(User::try_from).collect()
    }
}

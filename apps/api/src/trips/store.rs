//! Trip persistence: `TripStore` trait and its PostgreSQL implementation.
//!
//! Every method is scoped by owner: a trip that exists but belongs to someone
//! else is indistinguishable from a missing one.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::GeneratedPlan;
use crate::models::trip::{NewTrip, Trip, TripPatch, TripRow};
use crate::trips::query::ListQuery;

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn create(&self, owner_id: Uuid, trip: NewTrip) -> Result<Trip, AppError>;

    async fn list(&self, owner_id: Uuid, query: &ListQuery) -> Result<Vec<Trip>, AppError>;

    /// `None` when the trip is absent or not owned by `owner_id`.
    async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Trip>, AppError>;

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TripPatch,
    ) -> Result<Option<Trip>, AppError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError>;

    /// Replaces `ai_plan` wholesale and bumps `updated_at`.
    async fn apply_plan(
        &self,
        id: Uuid,
        owner_id: Uuid,
        plan: &GeneratedPlan,
    ) -> Result<Option<Trip>, AppError>;
}

pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize {what}: {e}")))
}

fn into_trip(row: TripRow) -> Result<Trip, AppError> {
    Trip::try_from(row).map_err(AppError::Internal)
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn create(&self, owner_id: Uuid, trip: NewTrip) -> Result<Trip, AppError> {
        let destinations = to_json(&trip.destinations, "destinations")?;
        let preferences = Value::Object(trip.preferences);

        let row = sqlx::query_as::<_, TripRow>(
            r#"
            INSERT INTO trips (id, user_id, title, destinations, preferences, budget, days, ai_plan)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&trip.title)
        .bind(&destinations)
        .bind(&preferences)
        .bind(trip.budget)
        .bind(trip.days)
        .fetch_one(&self.pool)
        .await?;

        into_trip(row)
    }

    async fn list(&self, owner_id: Uuid, query: &ListQuery) -> Result<Vec<Trip>, AppError> {
        let mut builder = QueryBuilder::new("SELECT * FROM trips WHERE user_id = ");
        builder.push_bind(owner_id);

        if let Some(pattern) = query.title_pattern() {
            builder.push(" AND title ILIKE ");
            builder.push_bind(pattern);
        }

        // Column and direction come from a fixed whitelist, never from input.
        builder.push(format!(
            " ORDER BY {} {}, id",
            query.sort.column(),
            query.direction.as_sql()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset());

        let rows = builder
            .build_query_as::<TripRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_trip).collect()
    }

    async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Trip>, AppError> {
        sqlx::query_as::<_, TripRow>("SELECT * FROM trips WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_trip)
            .transpose()
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TripPatch,
    ) -> Result<Option<Trip>, AppError> {
        let destinations = patch
            .destinations
            .as_ref()
            .map(|d| to_json(d, "destinations"))
            .transpose()?;
        let preferences = patch.preferences.map(Value::Object);

        // $6 / $8 flag whether budget / days were sent at all; a sent null clears the column.
        sqlx::query_as::<_, TripRow>(
            r#"
            UPDATE trips SET
                title        = COALESCE($3, title),
                destinations = COALESCE($4, destinations),
                preferences  = COALESCE($5, preferences),
                budget       = CASE WHEN $6 THEN $7 ELSE budget END,
                days         = CASE WHEN $8 THEN $9 ELSE days END,
                updated_at   = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(destinations)
        .bind(preferences)
        .bind(patch.budget.is_some())
        .bind(patch.budget.flatten())
        .bind(patch.days.is_some())
        .bind(patch.days.flatten())
        .fetch_optional(&self.pool)
        .await?
        .map(into_trip)
        .transpose()
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_plan(
        &self,
        id: Uuid,
        owner_id: Uuid,
        plan: &GeneratedPlan,
    ) -> Result<Option<Trip>, AppError> {
        let plan = to_json(plan, "ai_plan")?;

        sqlx::query_as::<_, TripRow>(
            r#"
            UPDATE trips SET ai_plan = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&plan)
        .fetch_optional(&self.pool)
        .await?
        .map(into_trip)
        .transpose()
    }
}

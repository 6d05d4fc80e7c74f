use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ai::{AiAnalysis, RawMeals};

/// One analyzed meal-log entry, stored with the model output it was built
/// from so history needs no re-analysis.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MealLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_index: i32,
    pub raw_meals: Json<RawMeals>,
    pub ai_analysis: Json<AiAnalysis>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const RETURNING: &str = r#"
    RETURNING id, user_id, day_index, raw_meals, ai_analysis,
              calories, protein, carbs, fat, created_at
"#;

/// Inserts a new entry. The day index is the user's current entry count
/// plus one, assigned inside the statement so it needs no separate read.
pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    raw_meals: &RawMeals,
    analysis: &AiAnalysis,
) -> anyhow::Result<MealLog> {
    let sql = format!(
        r#"
        INSERT INTO meal_logs (user_id, day_index, raw_meals, ai_analysis,
                               calories, protein, carbs, fat)
        VALUES (
            $1,
            (SELECT (COUNT(*) + 1)::int FROM meal_logs WHERE user_id = $1),
            $2, $3, $4, $5, $6, $7
        )
        {RETURNING}
        "#
    );
    let log = sqlx::query_as::<_, MealLog>(&sql)
        .bind(user_id)
        .bind(Json(raw_meals))
        .bind(Json(analysis))
        .bind(analysis.totals.calories)
        .bind(analysis.totals.protein)
        .bind(analysis.totals.carbs)
        .bind(analysis.totals.fats)
        .fetch_one(db)
        .await?;
    Ok(log)
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MealLog>> {
    let rows = sqlx::query_as::<_, MealLog>(
        r#"
        SELECT id, user_id, day_index, raw_meals, ai_analysis,
               calories, protein, carbs, fat, created_at
        FROM meal_logs
        WHERE user_id = $1
        ORDER BY day_index ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_for_user(
    db: &PgPool,
    log_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<MealLog>> {
    let log = sqlx::query_as::<_, MealLog>(
        r#"
        SELECT id, user_id, day_index, raw_meals, ai_analysis,
               calories, protein, carbs, fat, created_at
        FROM meal_logs
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(log_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(log)
}

/// Replaces the meals and analysis of an existing entry. `None` when the
/// entry does not exist or belongs to someone else.
pub async fn update_for_user(
    db: &PgPool,
    log_id: Uuid,
    user_id: Uuid,
    raw_meals: &RawMeals,
    analysis: &AiAnalysis,
) -> anyhow::Result<Option<MealLog>> {
    let sql = format!(
        r#"
        UPDATE meal_logs
        SET raw_meals = $3, ai_analysis = $4,
            calories = $5, protein = $6, carbs = $7, fat = $8
        WHERE id = $1 AND user_id = $2
        {RETURNING}
        "#
    );
    let log = sqlx::query_as::<_, MealLog>(&sql)
        .bind(log_id)
        .bind(user_id)
        .bind(Json(raw_meals))
        .bind(Json(analysis))
        .bind(analysis.totals.calories)
        .bind(analysis.totals.protein)
        .bind(analysis.totals.carbs)
        .bind(analysis.totals.fats)
        .fetch_optional(db)
        .await?;
    Ok(log)
}

pub async fn delete_for_user(db: &PgPool, log_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM meal_logs
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(log_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

use sqlx::PgPool;
use uuid::Uuid;

use super::calculator::{Plan, PlanInput};
use super::dto::MaintenanceSummary;

/// Writes the profile and its derived targets in one atomic statement.
/// Keyed on `user_id`, so resubmitting replaces rather than duplicates.
pub async fn upsert_profile(
    db: &PgPool,
    user_id: Uuid,
    input: PlanInput,
    plan: Plan,
) -> anyhow::Result<MaintenanceSummary> {
    let summary = sqlx::query_as::<_, MaintenanceSummary>(
        r#"
        INSERT INTO maintenance_profiles (
            user_id, goal_type, duration_months, target_kg, age, sex,
            height_cm, weight_kg, activity_factor,
            maintenance_calories, goal_calories, recommended_protein_g
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (user_id) DO UPDATE SET
            goal_type = EXCLUDED.goal_type,
            duration_months = EXCLUDED.duration_months,
            target_kg = EXCLUDED.target_kg,
            age = EXCLUDED.age,
            sex = EXCLUDED.sex,
            height_cm = EXCLUDED.height_cm,
            weight_kg = EXCLUDED.weight_kg,
            activity_factor = EXCLUDED.activity_factor,
            maintenance_calories = EXCLUDED.maintenance_calories,
            goal_calories = EXCLUDED.goal_calories,
            recommended_protein_g = EXCLUDED.recommended_protein_g,
            updated_at = now()
        RETURNING maintenance_calories, goal_calories,
                  recommended_protein_g AS recommended_protein
        "#,
    )
    .bind(user_id)
    .bind(input.goal_type.as_str())
    .bind(input.duration_months as i32)
    .bind(input.target_kg)
    .bind(input.age as i32)
    .bind(input.sex.as_str())
    .bind(input.height_cm)
    .bind(input.weight_kg)
    .bind(input.activity_factor)
    .bind(plan.maintenance_calories)
    .bind(plan.goal_calories)
    .bind(plan.recommended_protein_g)
    .fetch_one(db)
    .await?;
    Ok(summary)
}

pub async fn find_summary(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<MaintenanceSummary>> {
    let summary = sqlx::query_as::<_, MaintenanceSummary>(
        r#"
        SELECT maintenance_calories, goal_calories,
               recommended_protein_g AS recommended_protein
        FROM maintenance_profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(summary)
}

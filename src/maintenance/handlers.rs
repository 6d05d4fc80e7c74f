use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{
    calculator,
    dto::{MaintenanceRequest, MaintenanceResponse},
    repo,
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Recomputes the plan from the submitted measurements and stores both,
/// replacing any earlier profile for the user.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn save(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<MaintenanceRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<MaintenanceResponse>)> {
    let input = payload.plan_input();
    let plan = calculator::compute(input).map_err(|e| ApiError::validation(e.to_string()))?;

    let maintenance = repo::upsert_profile(&state.db, user.id, input, plan).await?;
    info!(
        goal_type = input.goal_type.as_str(),
        maintenance_calories = plan.maintenance_calories,
        "maintenance profile saved"
    );
    Ok((StatusCode::CREATED, Json(MaintenanceResponse { maintenance })))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<MaintenanceResponse>> {
    let maintenance = repo::find_summary(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Maintenance data"))?;
    Ok(Json(MaintenanceResponse { maintenance }))
}

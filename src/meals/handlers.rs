use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{AnalyzeMealsRequest, DataResponse, DeleteResponse},
    repo::{self, MealLog},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Sends the submitted meals to the model and stores the normalized
/// analysis as a new log entry for the user.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn analyze(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<AnalyzeMealsRequest>, ApiError>,
) -> ApiResult<Json<DataResponse<MealLog>>> {
    let meals = payload
        .meals
        .ok_or_else(|| ApiError::validation("No meals provided"))?;

    let analysis = state.ai.analyze_meals(&meals).await?;
    let log = repo::create(&state.db, user.id, &meals, &analysis).await?;

    info!(log_id = %log.id, day_index = log.day_index, "meal log created");
    Ok(Json(DataResponse { data: log }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DataResponse<Vec<MealLog>>>> {
    let logs = repo::list_for_user(&state.db, user.id).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// Re-analyzes the replacement meals and overwrites the entry.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(log_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<AnalyzeMealsRequest>, ApiError>,
) -> ApiResult<Json<DataResponse<MealLog>>> {
    let meals = payload
        .meals
        .ok_or_else(|| ApiError::validation("No meals provided"))?;

    // Confirm the entry exists and is the caller's before paying for an
    // upstream analysis call.
    repo::find_for_user(&state.db, log_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Meal log"))?;

    let analysis = state.ai.analyze_meals(&meals).await?;
    let log = repo::update_for_user(&state.db, log_id, user.id, &meals, &analysis)
        .await?
        .ok_or(ApiError::NotFound("Meal log"))?;

    info!(log_id = %log.id, "meal log updated");
    Ok(Json(DataResponse { data: log }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(log_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = repo::delete_for_user(&state.db, log_id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Meal log"));
    }

    info!(log_id = %log_id, "meal log deleted");
    Ok(Json(DeleteResponse { success: true }))
}

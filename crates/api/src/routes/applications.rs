use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::applications::{
    ApplicationService, ApplicationStatusUpdateRequest, ApplicationView, SubmitApplicationRequest,
};
use crate::state::AppState;

pub async fn submit(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<Json<ApplicationView>, AppError> {
    let view = ApplicationService::new(state)
        .submit(claims.user_id()?, req)
        .await?;
    Ok(Json(view))
}

pub async fn update_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplicationStatusUpdateRequest>,
) -> Result<Json<ApplicationView>, AppError> {
    let view = ApplicationService::new(state)
        .update_status(id, claims.user_id()?, req)
        .await?;
    Ok(Json(view))
}

pub async fn by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationView>, AppError> {
    let view = ApplicationService::new(state).by_id(id).await?;
    Ok(Json(view))
}

pub async fn list_for_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    let views = ApplicationService::new(state)
        .list_for_tournament(tournament_id)
        .await?;
    Ok(Json(views))
}

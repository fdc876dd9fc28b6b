use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::fights::{FightDateUpdateRequest, FightResultRequest, FightService};
use crate::state::AppState;

pub async fn record_result(
    State(state): State<AppState>,
    Path(fight_id): Path<Uuid>,
    Json(req): Json<FightResultRequest>,
) -> Result<(), AppError> {
    FightService::new(state).record_result(fight_id, req).await
}

pub async fn update_date(
    State(state): State<AppState>,
    claims: Claims,
    Path(fight_id): Path<Uuid>,
    Json(req): Json<FightDateUpdateRequest>,
) -> Result<(), AppError> {
    FightService::new(state)
        .update_date(fight_id, claims.user_id()?, req)
        .await
}

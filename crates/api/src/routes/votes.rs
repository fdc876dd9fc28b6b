use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::votes::{KnightForVotingView, VoteRequest, VoteService};
use crate::state::AppState;

pub async fn knights_for_voting(
    State(state): State<AppState>,
    claims: Claims,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<KnightForVotingView>>, AppError> {
    let knights = VoteService::new(state)
        .knights_for_voting(tournament_id, claims.user_id()?)
        .await?;
    Ok(Json(knights))
}

pub async fn submit(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<VoteRequest>,
) -> Result<(), AppError> {
    VoteService::new(state).submit(claims.user_id()?, req).await
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use infra::models::TournamentRole;
use infra::pagination::LimitOffset;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::brackets::{BracketService, BracketView};
use crate::services::prizes::{PrizeService, PrizeView};
use crate::services::roles::{ParticipantView, RoleService};
use crate::services::tournaments::{
    CompleteOutcome, CreateTournamentRequest, TournamentService, TournamentView,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantsQuery {
    pub role: TournamentRole,
}

pub async fn create(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<Json<TournamentView>, AppError> {
    let view = TournamentService::new(state)
        .create(claims.user_id()?, req)
        .await?;
    Ok(Json(view))
}

pub async fn list(
    State(state): State<AppState>,
    claims: Claims,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<TournamentView>>, AppError> {
    let views = TournamentService::new(state)
        .list(
            Some(claims.user_id()?),
            LimitOffset::clamped(page.limit, page.offset),
        )
        .await?;
    Ok(Json(views))
}

pub async fn get_one(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentView>, AppError> {
    let view = TournamentService::new(state)
        .get(id, Some(claims.user_id()?))
        .await?;
    Ok(Json(view))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompleteOutcome>, AppError> {
    let outcome = TournamentService::new(state).complete(id).await?;
    Ok(Json(outcome))
}

pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketView>, AppError> {
    let service = BracketService::new(state);
    service.generate(id).await?;
    let view = service.bracket(id).await?;
    Ok(Json(view))
}

pub async fn bracket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketView>, AppError> {
    let view = BracketService::new(state).bracket(id).await?;
    Ok(Json(view))
}

pub async fn prizes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PrizeView>>, AppError> {
    let views = PrizeService::new(state).distribution(id).await?;
    Ok(Json(views))
}

pub async fn participants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ParticipantsQuery>,
) -> Result<Json<Vec<ParticipantView>>, AppError> {
    let views = RoleService::new(state).participants(id, query.role).await?;
    Ok(Json(views))
}

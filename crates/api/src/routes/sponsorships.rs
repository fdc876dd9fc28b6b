use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::sponsorships::{SponsorshipRequest, SponsorshipService, SponsorshipView};
use crate::state::AppState;

pub async fn sponsor(
    State(state): State<AppState>,
    claims: Claims,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<SponsorshipRequest>,
) -> Result<Json<SponsorshipView>, AppError> {
    let view = SponsorshipService::new(state)
        .sponsor(tournament_id, claims.user_id()?, req)
        .await?;
    Ok(Json(view))
}

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::tickets::{TicketBookingRequest, TicketService, TicketView};
use crate::state::AppState;

pub async fn book(
    State(state): State<AppState>,
    claims: Claims,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<TicketBookingRequest>,
) -> Result<Json<TicketView>, AppError> {
    let view = TicketService::new(state)
        .book(tournament_id, claims.user_id()?, req)
        .await?;
    Ok(Json(view))
}

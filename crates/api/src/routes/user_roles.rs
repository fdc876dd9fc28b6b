use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use infra::models::TournamentRole;

use crate::auth::Claims;
use crate::error::AppError;
use crate::services::roles::{RoleService, UserRoleView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRoleView {
    pub tournament_id: Uuid,
    pub role: Option<TournamentRole>,
}

pub async fn my_tournaments(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<UserRoleView>>, AppError> {
    let views = RoleService::new(state)
        .tournaments_of_user(claims.user_id()?)
        .await?;
    Ok(Json(views))
}

pub async fn my_role_in_tournament(
    State(state): State<AppState>,
    claims: Claims,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<MyRoleView>, AppError> {
    let roles = RoleService::new(state)
        .roles_of(claims.user_id()?, tournament_id)
        .await?;
    Ok(Json(MyRoleView {
        tournament_id,
        role: roles.first().copied(),
    }))
}

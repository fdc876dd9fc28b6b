pub mod applications;
pub mod brackets;
pub mod fights;
pub mod notify;
pub mod prizes;
pub mod roles;
pub mod sponsorships;
pub mod tickets;
pub mod tournaments;
pub mod votes;

use std::str::FromStr;

use anyhow::anyhow;
use uuid::Uuid;

use infra::models::{TournamentRow, TournamentStatus, UserRow};
use infra::store::{TournamentStore, UserStore};
use infra::Store;

use crate::error::AppError;

pub(crate) async fn load_tournament(
    store: &dyn Store,
    id: Uuid,
) -> Result<TournamentRow, AppError> {
    store
        .tournament(id)
        .await?
        .ok_or(AppError::NotFound("tournament"))
}

pub(crate) async fn load_user(store: &dyn Store, id: Uuid) -> Result<UserRow, AppError> {
    store.user(id).await?.ok_or(AppError::NotFound("user"))
}

pub(crate) fn status_of(tournament: &TournamentRow) -> Result<TournamentStatus, AppError> {
    TournamentStatus::from_str(&tournament.status).map_err(|e| AppError::Anyhow(anyhow!(e)))
}

/// Status gate shared by every guarded operation.
pub(crate) fn require_status(
    tournament: &TournamentRow,
    expected: TournamentStatus,
    operation: &str,
) -> Result<(), AppError> {
    if status_of(tournament)? == expected {
        Ok(())
    } else {
        Err(AppError::InvalidState(format!(
            "{operation} requires status {expected}, tournament is {}",
            tournament.status
        )))
    }
}

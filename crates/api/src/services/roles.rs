//! Participation ledger: one role per user per tournament.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use infra::models::TournamentRole;
use infra::store::{ApplicationStore, RoleStore, SponsorshipStore, TicketStore};

use crate::error::AppError;
use crate::services::load_tournament;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: Uuid,
    pub name: String,
    pub second_name: String,
    pub email: String,
    pub role: TournamentRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_seats_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsorship_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleView {
    pub tournament_id: Uuid,
    pub role: TournamentRole,
}

pub struct RoleService {
    state: AppState,
}

impl RoleService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn roles_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> Result<Vec<TournamentRole>, AppError> {
        Ok(self.state.store().roles_of(user_id, tournament_id).await?)
    }

    /// Grants a role; the store refuses when the user already holds any role
    /// in this tournament.
    pub async fn grant(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> Result<(), AppError> {
        if self
            .state
            .store()
            .grant_role(user_id, tournament_id, role)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::RoleConflict)
        }
    }

    pub async fn revoke(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> Result<bool, AppError> {
        let removed = self
            .state
            .store()
            .revoke_role(user_id, tournament_id, role)
            .await?;
        if removed {
            info!("revoked role {role} from user {user_id} in tournament {tournament_id}");
        }
        Ok(removed)
    }

    /// Participants holding `role`, enriched with the detail record that made
    /// them a participant.
    pub async fn participants(
        &self,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> Result<Vec<ParticipantView>, AppError> {
        let store = self.state.store();
        load_tournament(store, tournament_id).await?;

        let users = store.users_with_role(tournament_id, role).await?;
        let mut views = Vec::with_capacity(users.len());

        for user in users {
            let mut view = ParticipantView {
                id: user.id,
                name: user.name,
                second_name: user.second_name,
                email: user.email,
                role,
                application_status: None,
                application_comment: None,
                ticket_seats_count: None,
                booking_code: None,
                package_type: None,
                sponsorship_amount: None,
                company_name: None,
            };

            match role {
                TournamentRole::Knight => {
                    if let Some(app) = store.application_of(view.id, tournament_id).await? {
                        view.application_status = Some(app.status);
                        view.application_comment = app.comment;
                    }
                }
                TournamentRole::Spectator => {
                    if let Some(ticket) = store.confirmed_ticket_of(view.id, tournament_id).await? {
                        view.ticket_seats_count = Some(ticket.seats_count);
                        view.booking_code = Some(ticket.booking_code);
                    }
                }
                TournamentRole::Sponsor => {
                    if let Some(s) = store.sponsorship_of(view.id, tournament_id).await? {
                        view.package_type = Some(s.package);
                        view.sponsorship_amount = Some(s.amount);
                        view.company_name = Some(s.company_name);
                    }
                }
                TournamentRole::Organizer => {}
            }

            views.push(view);
        }

        Ok(views)
    }

    /// Every (tournament, role) pair the user currently holds.
    pub async fn tournaments_of_user(&self, user_id: Uuid) -> Result<Vec<UserRoleView>, AppError> {
        let rows = self.state.store().roles_for_user(user_id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                TournamentRole::from_str(&r.role).ok().map(|role| UserRoleView {
                    tournament_id: r.tournament_id,
                    role,
                })
            })
            .collect())
    }
}

//! Tournament creation, views, and the closing transition of the lifecycle.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use infra::models::{TournamentRole, TournamentRow, TournamentStatus};
use infra::pagination::LimitOffset;
use infra::store::{
    NewTournament, RoleStore, SponsorshipStore, TicketStore, TournamentStore, UserStore,
};

use crate::error::AppError;
use crate::services::notify::Notice;
use crate::services::prizes::PrizeService;
use crate::services::votes::VoteService;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

const ALLOWED_KNIGHT_COUNTS: [i32; 5] = [1, 2, 4, 8, 16];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    pub required_amount: Decimal,
    pub description: Option<String>,
    pub prize_percent_num: Decimal,
    pub event_date: NaiveDate,
    pub total_seats: i32,
    pub required_knights: i32,
    /// Venue shortlist from the organizer UI; venue management lives outside
    /// the lifecycle core, so the ids are accepted and left to that service.
    #[serde(default)]
    pub selected_locations_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub collected_amount: Decimal,
    pub required_amount: Decimal,
    pub prize_percent_num: Decimal,
    pub tournament_status: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub event_date: NaiveDate,
    pub organizer_name: String,
    pub total_knights: i32,
    pub available_knight_slots: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<TournamentRole>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOutcome {
    pub message: String,
    pub sympathy_winner_id: Option<Uuid>,
}

pub struct TournamentService {
    state: AppState,
}

impl TournamentService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn create(
        &self,
        organizer_id: Uuid,
        req: CreateTournamentRequest,
    ) -> Result<TournamentView, AppError> {
        let store = self.state.store();
        let organizer = load_user(store, organizer_id).await?;

        if !organizer.organizer {
            return Err(AppError::Forbidden("only organizers can create tournaments"));
        }
        if req.name.trim().is_empty() {
            return Err(AppError::BadRequest("tournament name is required".into()));
        }
        if req.required_amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(
                "required amount must be positive".into(),
            ));
        }
        if req.prize_percent_num < Decimal::ZERO || req.prize_percent_num > dec!(100) {
            return Err(AppError::BadRequest(
                "prize percent must be between 0 and 100".into(),
            ));
        }
        if !ALLOWED_KNIGHT_COUNTS.contains(&req.required_knights) {
            return Err(AppError::BadRequest(
                "required knights must be 1, 2, 4, 8 or 16".into(),
            ));
        }
        if req.total_seats < 1 {
            return Err(AppError::BadRequest(
                "total seats must be at least 1".into(),
            ));
        }

        let tournament = store
            .insert_tournament(NewTournament {
                name: req.name,
                description: req.description,
                required_amount: req.required_amount,
                prize_percent: req.prize_percent_num,
                required_knights: req.required_knights,
                total_seats: req.total_seats,
                event_date: req.event_date,
                status: TournamentStatus::WaitingDonation,
                organizer_id: organizer.id,
            })
            .await?;

        if !store
            .grant_role(organizer.id, tournament.id, TournamentRole::Organizer)
            .await?
        {
            return Err(AppError::RoleConflict);
        }

        info!("tournament {} created by {}", tournament.name, organizer.email);
        self.state.notifier().deliver(
            &organizer.email,
            Notice::TournamentCreated {
                tournament: tournament.name.clone(),
            },
        );

        self.view(&tournament, Some(organizer.id)).await
    }

    pub async fn get(&self, id: Uuid, viewer: Option<Uuid>) -> Result<TournamentView, AppError> {
        let tournament = load_tournament(self.state.store(), id).await?;
        self.view(&tournament, viewer).await
    }

    pub async fn list(
        &self,
        viewer: Option<Uuid>,
        page: LimitOffset,
    ) -> Result<Vec<TournamentView>, AppError> {
        let rows = self.state.store().list_tournaments(page).await?;
        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            views.push(self.view(row, viewer).await?);
        }
        Ok(views)
    }

    pub async fn view(
        &self,
        tournament: &TournamentRow,
        viewer: Option<Uuid>,
    ) -> Result<TournamentView, AppError> {
        let store = self.state.store();

        let collected = store.confirmed_sponsor_sum(tournament.id).await?;
        let booked = store.confirmed_seats_sum(tournament.id).await?;
        let knights = store
            .users_with_role(tournament.id, TournamentRole::Knight)
            .await?
            .len() as i32;

        let organizer_name = match store.user(tournament.organizer_id).await? {
            Some(user) => user.full_name(),
            None => "unknown".to_string(),
        };

        let user_role = match viewer {
            Some(user_id) => store
                .roles_of(user_id, tournament.id)
                .await?
                .first()
                .copied(),
            None => None,
        };

        Ok(TournamentView {
            id: tournament.id,
            name: tournament.name.clone(),
            description: tournament.description.clone(),
            collected_amount: collected,
            required_amount: tournament.required_amount,
            prize_percent_num: tournament.prize_percent,
            tournament_status: tournament.status.clone(),
            total_seats: tournament.total_seats,
            available_seats: tournament.total_seats - booked,
            event_date: tournament.event_date,
            organizer_name,
            total_knights: tournament.required_knights,
            available_knight_slots: tournament.required_knights - knights,
            user_role,
        })
    }

    /// Closes an active tournament and fires the prize distribution. The
    /// completion commits even when the distribution fails; the failure is
    /// reported in the response message instead of rolling the close back.
    pub async fn complete(&self, id: Uuid) -> Result<CompleteOutcome, AppError> {
        let store = self.state.store();
        let tournament = load_tournament(store, id).await?;
        require_status(&tournament, TournamentStatus::Active, "completing")?;

        let sympathy_winner_id = VoteService::new(self.state.clone()).winner(id).await?;

        if !store
            .transition_status(id, TournamentStatus::Active, TournamentStatus::Completed)
            .await?
        {
            return Err(AppError::InvalidState(
                "tournament is no longer active".into(),
            ));
        }
        info!("tournament {} completed", tournament.name);

        let message = match PrizeService::new(self.state.clone())
            .calculate(id, sympathy_winner_id)
            .await
        {
            Ok(_) => "tournament completed; prize pool distributed".to_string(),
            Err(e) => {
                warn!("prize calculation failed for tournament {id}: {e}");
                format!("tournament completed; prize calculation failed: {e}")
            }
        };

        Ok(CompleteOutcome {
            message,
            sympathy_winner_id,
        })
    }
}

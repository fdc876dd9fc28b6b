//! Seat booking during ticket sales; selling the last seat arms the arena.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use infra::models::{TournamentRole, TournamentStatus};
use infra::store::{NewTicket, RoleStore, TicketStore, TournamentStore};

use crate::error::AppError;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketBookingRequest {
    pub seats_count: i32,
    pub agree_to_rules: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub seats_count: i32,
    pub booking_code: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

pub struct TicketService {
    state: AppState,
}

impl TicketService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn book(
        &self,
        tournament_id: Uuid,
        spectator_id: Uuid,
        req: TicketBookingRequest,
    ) -> Result<TicketView, AppError> {
        if !(1..=4).contains(&req.seats_count) {
            return Err(AppError::BadRequest(
                "between 1 and 4 seats can be booked".into(),
            ));
        }
        if !req.agree_to_rules {
            return Err(AppError::BadRequest(
                "the arena rules must be accepted".into(),
            ));
        }

        let store = self.state.store();

        let tournament = load_tournament(store, tournament_id).await?;
        require_status(&tournament, TournamentStatus::TicketSales, "booking")?;

        let spectator = load_user(store, spectator_id).await?;

        if store
            .confirmed_ticket_of(spectator_id, tournament_id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "a booking for this tournament already exists".into(),
            ));
        }

        // One role per user per tournament; the grant is the atomic guard.
        if !store
            .grant_role(spectator_id, tournament_id, TournamentRole::Spectator)
            .await?
        {
            return Err(AppError::RoleConflict);
        }

        let booking_code = Uuid::new_v4().to_string();
        let inserted = store
            .insert_ticket_checked(
                NewTicket {
                    spectator_id,
                    tournament_id,
                    seats_count: req.seats_count,
                    booking_code,
                },
                tournament.total_seats,
            )
            .await?;

        let ticket = match inserted {
            Some(ticket) => ticket,
            None => {
                store
                    .revoke_role(spectator_id, tournament_id, TournamentRole::Spectator)
                    .await?;
                // The store refuses both an over-capacity booking and a raced
                // duplicate; tell them apart before reporting.
                if store
                    .confirmed_ticket_of(spectator_id, tournament_id)
                    .await?
                    .is_some()
                {
                    return Err(AppError::BadRequest(
                        "a booking for this tournament already exists".into(),
                    ));
                }
                return Err(AppError::InsufficientSeats);
            }
        };

        info!(
            "ticket {} issued for tournament {} ({} seats)",
            ticket.booking_code, tournament.name, ticket.seats_count
        );
        self.state.notifier().deliver(
            &spectator.email,
            Notice::TicketIssued {
                tournament: tournament.name.clone(),
                booking_code: ticket.booking_code.clone(),
                seats: ticket.seats_count,
            },
        );

        // Sold out: the booking that fills the hall flips the tournament to
        // active play.
        let booked = store.confirmed_seats_sum(tournament_id).await?;
        if booked >= tournament.total_seats
            && store
                .transition_status(
                    tournament_id,
                    TournamentStatus::TicketSales,
                    TournamentStatus::Active,
                )
                .await?
        {
            info!("tournament {} sold out, now active", tournament.name);
        }

        Ok(TicketView {
            id: ticket.id,
            tournament_id: ticket.tournament_id,
            seats_count: ticket.seats_count,
            booking_code: ticket.booking_code,
            confirmed: ticket.confirmed,
            created_at: ticket.created_at,
        })
    }
}

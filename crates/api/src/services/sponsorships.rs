//! Sponsorship intake during the funding phase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use infra::models::{SponsorPackage, SponsorshipStatus, TournamentRole, TournamentStatus};
use infra::store::{NewSponsorship, RoleStore, SponsorshipStore, TournamentStore};

use crate::error::AppError;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipRequest {
    pub package_type: SponsorPackage,
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipView {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub package_type: String,
    pub amount: Decimal,
    pub company_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct SponsorshipService {
    state: AppState,
}

impl SponsorshipService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn sponsor(
        &self,
        tournament_id: Uuid,
        sponsor_id: Uuid,
        req: SponsorshipRequest,
    ) -> Result<SponsorshipView, AppError> {
        let store = self.state.store();

        let tournament = load_tournament(store, tournament_id).await?;
        require_status(&tournament, TournamentStatus::WaitingDonation, "sponsoring")?;

        let sponsor = load_user(store, sponsor_id).await?;

        let collected = store.confirmed_sponsor_sum(tournament_id).await?;
        if collected >= tournament.required_amount {
            return Err(AppError::InvalidState(
                "the funding goal has already been reached".into(),
            ));
        }

        // One role per user per tournament; the grant is the atomic guard.
        if !store
            .grant_role(sponsor_id, tournament_id, TournamentRole::Sponsor)
            .await?
        {
            return Err(AppError::RoleConflict);
        }

        let amount = req.package_type.amount();
        let sponsorship = store
            .insert_sponsorship(NewSponsorship {
                sponsor_id,
                tournament_id,
                package: req.package_type.as_str().to_string(),
                amount,
                company_name: req.company_name.clone(),
                status: SponsorshipStatus::Confirmed,
            })
            .await?;

        info!(
            "sponsorship of {amount} by {} confirmed for tournament {}",
            req.company_name, tournament.name
        );
        self.state.notifier().deliver(
            &sponsor.email,
            Notice::SponsorshipConfirmed {
                tournament: tournament.name.clone(),
                package: sponsorship.package.clone(),
                amount,
            },
        );

        // Re-read inside the mutating path: the first sponsorship that tops
        // up the pool wins the compare-and-swap and opens registration.
        let collected = store.confirmed_sponsor_sum(tournament_id).await?;
        if collected >= tournament.required_amount
            && store
                .transition_status(
                    tournament_id,
                    TournamentStatus::WaitingDonation,
                    TournamentStatus::KnightRegistration,
                )
                .await?
        {
            info!(
                "tournament {} fully funded ({collected}), knight registration open",
                tournament.name
            );
        }

        Ok(SponsorshipView {
            id: sponsorship.id,
            tournament_id: sponsorship.tournament_id,
            package_type: sponsorship.package,
            amount: sponsorship.amount,
            company_name: sponsorship.company_name,
            status: sponsorship.status,
            created_at: sponsorship.created_at,
        })
    }
}

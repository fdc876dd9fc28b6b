//! Prize distribution for a completed tournament.
//!
//! The pool is the confirmed sponsor total scaled by the tournament's prize
//! percentage. Placement comes from the match tree (final winner, final
//! loser, bronze winner); the sympathy winner is whatever the caller resolved
//! from the vote tally. A knight collecting several awards gets one row with
//! the amounts summed and the labels joined.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use infra::models::{PrizeRow, Round, TournamentStatus};
use infra::store::{MatchStore, NewPrize, PrizeStore, SponsorshipStore, UserStore};

use crate::error::AppError;
use crate::services::brackets::round_of;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

const SHARE_FIRST: Decimal = dec!(0.50);
const SHARE_SECOND: Decimal = dec!(0.25);
const SHARE_THIRD: Decimal = dec!(0.10);
const SHARE_SYMPATHY: Decimal = dec!(0.05);

const PLACE_FIRST: &str = "1st";
const PLACE_SECOND: &str = "2nd";
const PLACE_THIRD: &str = "3rd";
const PLACE_SYMPATHY: &str = "sympathy";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeView {
    pub knight_id: Uuid,
    pub place: String,
    pub amount: Decimal,
}

pub struct PrizeService {
    state: AppState,
}

impl PrizeService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Calculates and writes the distribution exactly once per tournament.
    pub async fn calculate(
        &self,
        tournament_id: Uuid,
        sympathy_winner_id: Option<Uuid>,
    ) -> Result<Vec<PrizeRow>, AppError> {
        let store = self.state.store();

        let tournament = load_tournament(store, tournament_id).await?;
        require_status(&tournament, TournamentStatus::Completed, "prize calculation")?;

        if store.prizes_exist(tournament_id).await? {
            return Err(AppError::IdempotencyViolation);
        }
        if tournament.prize_percent < Decimal::ZERO || tournament.prize_percent > dec!(100) {
            return Err(AppError::BadRequest(
                "tournament prize percent is out of range".into(),
            ));
        }

        let confirmed = store.confirmed_sponsor_sum(tournament_id).await?;
        let pool = confirmed * tournament.prize_percent / dec!(100);
        if pool <= Decimal::ZERO {
            return Err(AppError::EmptyPool);
        }

        let matches = store.matches_for_tournament(tournament_id).await?;

        let final_match = matches
            .iter()
            .find(|m| round_of(m) == Some(Round::Final))
            .ok_or_else(|| AppError::InvalidState("the tournament has no final match".into()))?;
        let first = final_match.winner_id.ok_or_else(|| {
            AppError::InvalidState("the final has no recorded winner".into())
        })?;
        let second = if final_match.fighter1_id == Some(first) {
            final_match.fighter2_id
        } else {
            final_match.fighter1_id
        };
        let third = matches
            .iter()
            .find(|m| round_of(m) == Some(Round::Bronze))
            .and_then(|m| m.winner_id);

        let mut awards: Vec<(Uuid, &str, Decimal)> = vec![(first, PLACE_FIRST, SHARE_FIRST)];
        if let Some(second) = second {
            awards.push((second, PLACE_SECOND, SHARE_SECOND));
        }
        if let Some(third) = third {
            awards.push((third, PLACE_THIRD, SHARE_THIRD));
        }
        if let Some(sympathy) = sympathy_winner_id {
            awards.push((sympathy, PLACE_SYMPATHY, SHARE_SYMPATHY));
        }

        let rows = merge_awards(pool, &awards)
            .into_iter()
            .map(|(knight_id, place, amount)| NewPrize {
                knight_id,
                tournament_id,
                place,
                amount,
            })
            .collect();

        let inserted = store.insert_prizes(rows).await?;
        info!(
            "prize pool of {pool} distributed over {} knights for tournament {}",
            inserted.len(),
            tournament.name
        );

        for prize in &inserted {
            if let Some(knight) = store.user(prize.knight_id).await? {
                self.state.notifier().deliver(
                    &knight.email,
                    Notice::PrizeAwarded {
                        tournament: tournament.name.clone(),
                        place: prize.place.clone(),
                        amount: prize.amount,
                    },
                );
            }
        }
        if let Some(organizer) = store.user(tournament.organizer_id).await? {
            self.state.notifier().deliver(
                &organizer.email,
                Notice::ReportReady {
                    tournament: tournament.name.clone(),
                },
            );
        }

        Ok(inserted)
    }

    pub async fn distribution(&self, tournament_id: Uuid) -> Result<Vec<PrizeView>, AppError> {
        let store = self.state.store();
        load_tournament(store, tournament_id).await?;
        let rows = store.prizes_for_tournament(tournament_id).await?;
        Ok(rows
            .into_iter()
            .map(|r| PrizeView {
                knight_id: r.knight_id,
                place: r.place,
                amount: r.amount,
            })
            .collect())
    }
}

/// One award's cut of the pool, rounded half-up to two fractional digits.
pub(crate) fn share_of(pool: Decimal, share: Decimal) -> Decimal {
    (pool * share).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Folds the award list into one row per knight, keeping award order in the
/// joined label ("1st, sympathy").
pub(crate) fn merge_awards(
    pool: Decimal,
    awards: &[(Uuid, &str, Decimal)],
) -> Vec<(Uuid, String, Decimal)> {
    let mut merged: Vec<(Uuid, String, Decimal)> = Vec::new();
    for (knight_id, place, share) in awards {
        let amount = share_of(pool, *share);
        match merged.iter_mut().find(|(id, _, _)| id == knight_id) {
            Some((_, label, total)) => {
                label.push_str(", ");
                label.push_str(place);
                *total += amount;
            }
            None => merged.push((*knight_id, place.to_string(), amount)),
        }
    }
    merged
}

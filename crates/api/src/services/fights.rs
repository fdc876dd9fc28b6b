//! Fight result entry, winner advancement, and fight rescheduling.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use infra::models::{MatchRow, Round, TournamentStatus, UserRow};
use infra::store::{MatchStore, UserStore};
use infra::Store;

use crate::error::AppError;
use crate::services::brackets::round_of;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightResultRequest {
    pub winner_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightDateUpdateRequest {
    pub new_fight_date: DateTime<Utc>,
}

pub struct FightService {
    state: AppState,
}

impl FightService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Records the outcome of a fight and promotes the winner through the
    /// tree. Re-entering a result is allowed so the judges can correct a
    /// mistyped winner.
    pub async fn record_result(
        &self,
        fight_id: Uuid,
        req: FightResultRequest,
    ) -> Result<(), AppError> {
        let store = self.state.store();

        let mut fight = store
            .match_by_id(fight_id)
            .await?
            .ok_or(AppError::NotFound("fight"))?;

        let tournament = load_tournament(store, fight.tournament_id).await?;
        require_status(&tournament, TournamentStatus::Active, "recording a result")?;

        let winner = load_user(store, req.winner_id).await?;
        let is_fighter =
            fight.fighter1_id == Some(winner.id) || fight.fighter2_id == Some(winner.id);
        if !is_fighter {
            return Err(AppError::BadRequest(
                "the winner must be one of the fighters of this match".into(),
            ));
        }

        fight.winner_id = Some(winner.id);
        fight.comment = req.comment.clone();
        store.update_match(&fight).await?;
        info!("fight {fight_id} decided: winner {}", winner.full_name());

        if fight.next_match_id.is_some() {
            self.promote_winner(store, &fight, winner.id).await?;
        }

        let round = round_of(&fight);
        let loser_id = if fight.fighter1_id == Some(winner.id) {
            fight.fighter2_id
        } else {
            fight.fighter1_id
        };

        if round == Some(Round::Semifinal) {
            if let Some(loser_id) = loser_id {
                self.send_loser_to_bronze(store, &fight, loser_id, &tournament.name)
                    .await?;
            }
        }

        self.send_result_notices(store, &fight, &winner, loser_id, &tournament.name)
            .await?;

        Ok(())
    }

    /// The winner takes the first free slot of the linked match. Both slots
    /// taken means the tree got out of shape; that is logged and swallowed so
    /// the recorded result itself stands.
    async fn promote_winner(
        &self,
        store: &dyn Store,
        fight: &MatchRow,
        winner_id: Uuid,
    ) -> Result<(), AppError> {
        let next_id = match fight.next_match_id {
            Some(id) => id,
            None => return Ok(()),
        };
        let mut next = match store.match_by_id(next_id).await? {
            Some(m) => m,
            None => return Ok(()),
        };

        if next.fighter1_id.is_none() {
            next.fighter1_id = Some(winner_id);
        } else if next.fighter2_id.is_none() {
            next.fighter2_id = Some(winner_id);
        } else {
            error!("bracket corruption: match {next_id} already has both fighters");
            return Ok(());
        }

        store.update_match(&next).await?;
        info!("fighter {winner_id} promoted to match {next_id}");

        if next.fighter1_id.is_some() && next.fighter2_id.is_some() {
            let tournament = load_tournament(store, next.tournament_id).await?;
            let organizer = load_user(store, tournament.organizer_id).await?;
            self.state
                .notifier()
                .deliver(&organizer.email, Notice::MatchReady { match_id: next.id });
        }

        Ok(())
    }

    /// Semifinal losers meet again in the third-place match.
    async fn send_loser_to_bronze(
        &self,
        store: &dyn Store,
        fight: &MatchRow,
        loser_id: Uuid,
        tournament_name: &str,
    ) -> Result<(), AppError> {
        let mut bronze = store
            .matches_for_tournament(fight.tournament_id)
            .await?
            .into_iter()
            .find(|m| round_of(m) == Some(Round::Bronze))
            .ok_or_else(|| anyhow::anyhow!("no third-place match in tournament"))?;

        if bronze.fighter1_id.is_none() {
            bronze.fighter1_id = Some(loser_id);
        } else if bronze.fighter2_id.is_none() {
            bronze.fighter2_id = Some(loser_id);
        } else {
            error!(
                "bracket corruption: third-place match {} already has both fighters",
                bronze.id
            );
            return Ok(());
        }
        store.update_match(&bronze).await?;

        if let Some(loser) = store.user(loser_id).await? {
            self.state.notifier().deliver(
                &loser.email,
                Notice::BronzeInvitation {
                    tournament: tournament_name.to_string(),
                },
            );
        }

        Ok(())
    }

    async fn send_result_notices(
        &self,
        store: &dyn Store,
        fight: &MatchRow,
        winner: &UserRow,
        loser_id: Option<Uuid>,
        tournament_name: &str,
    ) -> Result<(), AppError> {
        let round = match round_of(fight) {
            Some(round) => round,
            None => return Ok(()),
        };

        let winner_notice = if round == Round::Final {
            Notice::Champion {
                tournament: tournament_name.to_string(),
            }
        } else {
            Notice::MatchWon {
                tournament: tournament_name.to_string(),
                round,
            }
        };
        self.state.notifier().deliver(&winner.email, winner_notice);

        if let Some(loser_id) = loser_id {
            if let Some(loser) = store.user(loser_id).await? {
                self.state.notifier().deliver(
                    &loser.email,
                    Notice::MatchLost {
                        tournament: tournament_name.to_string(),
                        round,
                    },
                );
            }
        }

        Ok(())
    }

    /// Reschedules a fight; only the tournament organizer may do this.
    pub async fn update_date(
        &self,
        fight_id: Uuid,
        caller_id: Uuid,
        req: FightDateUpdateRequest,
    ) -> Result<(), AppError> {
        let store = self.state.store();

        let mut fight = store
            .match_by_id(fight_id)
            .await?
            .ok_or(AppError::NotFound("fight"))?;

        let tournament = load_tournament(store, fight.tournament_id).await?;
        if tournament.organizer_id != caller_id {
            return Err(AppError::Forbidden(
                "only the tournament organizer can reschedule fights",
            ));
        }

        let old_date = fight.fight_date;
        if old_date == req.new_fight_date {
            return Err(AppError::BadRequest(
                "the new fight date equals the current one".into(),
            ));
        }

        fight.fight_date = req.new_fight_date;
        store.update_match(&fight).await?;
        info!("fight {fight_id} rescheduled from {old_date} to {}", fight.fight_date);

        if let Some(round) = round_of(&fight) {
            for fighter_id in [fight.fighter1_id, fight.fighter2_id].into_iter().flatten() {
                if let Some(fighter) = store.user(fighter_id).await? {
                    self.state.notifier().deliver(
                        &fighter.email,
                        Notice::DateChanged {
                            tournament: tournament.name.clone(),
                            round,
                            old: old_date,
                            new: fight.fight_date,
                        },
                    );
                }
            }
        }

        Ok(())
    }
}

//! Single-elimination bracket construction and rendering.
//!
//! The whole tree is written up-front: first-round matches carry the shuffled
//! fighters, every later round starts empty, and each match of a non-final
//! round points at the match its winner advances to via `next_match_id`. The
//! third-place match stands alone and is fed by the semifinal losers.

use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use infra::models::{MatchRow, Round, TournamentStatus};
use infra::store::{ApplicationStore, MatchStore, NewMatch, TournamentStore, UserStore};
use infra::Store;

use crate::error::AppError;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub match_id: Uuid,
    pub round: String,
    pub round_display_name: String,
    pub fighter1_id: Option<Uuid>,
    pub fighter1_name: Option<String>,
    pub fighter2_id: Option<Uuid>,
    pub fighter2_name: Option<String>,
    pub winner_id: Option<Uuid>,
    pub winner_name: Option<String>,
    pub fight_date: DateTime<Utc>,
    pub comment: Option<String>,
    pub next_match_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
    pub tournament_id: Uuid,
    pub tournament_name: String,
    pub generated_at: DateTime<Utc>,
    pub matches: Vec<MatchView>,
}

pub(crate) fn valid_participant_count(n: usize) -> bool {
    matches!(n, 1 | 2 | 4 | 8 | 16)
}

pub(crate) fn first_round_for(n: usize) -> Option<Round> {
    match n {
        4 => Some(Round::Semifinal),
        8 => Some(Round::Quarterfinal),
        16 => Some(Round::RoundOf8),
        _ => None,
    }
}

pub(crate) fn next_round(round: Round) -> Option<Round> {
    match round {
        Round::RoundOf8 => Some(Round::Quarterfinal),
        Round::Quarterfinal => Some(Round::Semifinal),
        Round::Semifinal => Some(Round::Final),
        Round::Bronze | Round::Final => None,
    }
}

pub struct BracketService {
    state: AppState,
}

impl BracketService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Builds a fresh match tree from the approved knights and opens ticket
    /// sales. Any previously generated tree for the tournament is discarded.
    pub async fn generate(&self, tournament_id: Uuid) -> Result<(), AppError> {
        let store = self.state.store();

        let tournament = load_tournament(store, tournament_id).await?;
        require_status(
            &tournament,
            TournamentStatus::KnightRegistration,
            "bracket generation",
        )?;

        let knight_ids = store.approved_knight_ids(tournament_id).await?;
        let count = knight_ids.len();
        if !valid_participant_count(count) {
            return Err(AppError::BadParticipantCount(count));
        }

        store.delete_matches(tournament_id).await?;

        let mut seeded = knight_ids.clone();
        seeded.shuffle(&mut rand::thread_rng());

        let now = Utc::now();
        match count {
            1 => {
                // A lone knight is champion by default.
                store
                    .insert_match(NewMatch {
                        tournament_id,
                        round: Round::Final,
                        fighter1_id: Some(seeded[0]),
                        fighter2_id: None,
                        winner_id: Some(seeded[0]),
                        comment: Some("single participant".into()),
                        fight_date: now,
                    })
                    .await?;
            }
            2 => {
                store
                    .insert_match(NewMatch {
                        tournament_id,
                        round: Round::Final,
                        fighter1_id: Some(seeded[0]),
                        fighter2_id: Some(seeded[1]),
                        winner_id: None,
                        comment: None,
                        fight_date: now,
                    })
                    .await?;
            }
            _ => {
                self.build_tree(tournament_id, &seeded, now).await?;
            }
        }

        if !store
            .transition_status(
                tournament_id,
                TournamentStatus::KnightRegistration,
                TournamentStatus::TicketSales,
            )
            .await?
        {
            return Err(AppError::InvalidState(
                "tournament left knight registration while the bracket was being generated".into(),
            ));
        }

        info!(
            "bracket generated for tournament {} ({count} participants)",
            tournament.name
        );

        let organizer = load_user(store, tournament.organizer_id).await?;
        self.state.notifier().deliver(
            &organizer.email,
            Notice::BracketGenerated {
                tournament: tournament.name.clone(),
                knight_count: count,
            },
        );
        for knight_id in &knight_ids {
            if let Some(knight) = store.user(*knight_id).await? {
                self.state.notifier().deliver(
                    &knight.email,
                    Notice::BracketGenerated {
                        tournament: tournament.name.clone(),
                        knight_count: count,
                    },
                );
            }
        }

        Ok(())
    }

    /// Writes the rounds for four or more participants: paired first round,
    /// then ever-smaller empty rounds linked by `next_match_id`, plus the
    /// stand-alone third-place match one day after the final.
    async fn build_tree(
        &self,
        tournament_id: Uuid,
        seeded: &[Uuid],
        start: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let store = self.state.store();

        let mut round = first_round_for(seeded.len())
            .ok_or_else(|| AppError::Anyhow(anyhow!("no first round for {}", seeded.len())))?;

        let mut current: Vec<MatchRow> = Vec::with_capacity(seeded.len() / 2);
        for pair in seeded.chunks(2) {
            let row = store
                .insert_match(NewMatch {
                    tournament_id,
                    round,
                    fighter1_id: Some(pair[0]),
                    fighter2_id: Some(pair[1]),
                    winner_id: None,
                    comment: None,
                    fight_date: start,
                })
                .await?;
            current.push(row);
        }

        let mut round_date = start;
        while current.len() > 1 {
            let next = next_round(round)
                .ok_or_else(|| AppError::Anyhow(anyhow!("no round after {round}")))?;
            round_date += Duration::days(1);

            let mut next_matches = Vec::with_capacity(current.len() / 2);
            for _ in 0..current.len() / 2 {
                let row = store
                    .insert_match(NewMatch {
                        tournament_id,
                        round: next,
                        fighter1_id: None,
                        fighter2_id: None,
                        winner_id: None,
                        comment: None,
                        fight_date: round_date,
                    })
                    .await?;
                next_matches.push(row);
            }

            for (i, m) in current.iter_mut().enumerate() {
                m.next_match_id = Some(next_matches[i / 2].id);
                store.update_match(m).await?;
            }

            current = next_matches;
            round = next;
        }

        store
            .insert_match(NewMatch {
                tournament_id,
                round: Round::Bronze,
                fighter1_id: None,
                fighter2_id: None,
                winner_id: None,
                comment: Some("third-place match".into()),
                fight_date: round_date + Duration::days(1),
            })
            .await?;

        Ok(())
    }

    /// The full bracket sorted by round, early rounds first.
    pub async fn bracket(&self, tournament_id: Uuid) -> Result<BracketView, AppError> {
        let store = self.state.store();
        let tournament = load_tournament(store, tournament_id).await?;

        let mut matches = store.matches_for_tournament(tournament_id).await?;
        matches.sort_by_key(|m| round_of(m).map(|r| r.order()).unwrap_or(u8::MAX));

        let names = self.fighter_names(store, &matches).await?;
        let views = matches
            .into_iter()
            .map(|m| {
                let round_display_name = round_of(&m)
                    .map(|r| r.display_name().to_string())
                    .unwrap_or_else(|| m.round.clone());
                MatchView {
                    match_id: m.id,
                    round: m.round,
                    round_display_name,
                    fighter1_id: m.fighter1_id,
                    fighter1_name: m.fighter1_id.and_then(|id| names.get(&id).cloned()),
                    fighter2_id: m.fighter2_id,
                    fighter2_name: m.fighter2_id.and_then(|id| names.get(&id).cloned()),
                    winner_id: m.winner_id,
                    winner_name: m.winner_id.and_then(|id| names.get(&id).cloned()),
                    fight_date: m.fight_date,
                    comment: m.comment,
                    next_match_id: m.next_match_id,
                }
            })
            .collect();

        Ok(BracketView {
            tournament_id: tournament.id,
            tournament_name: tournament.name,
            generated_at: Utc::now(),
            matches: views,
        })
    }

    async fn fighter_names(
        &self,
        store: &dyn Store,
        matches: &[MatchRow],
    ) -> Result<HashMap<Uuid, String>, AppError> {
        let mut names = HashMap::new();
        for m in matches {
            for id in [m.fighter1_id, m.fighter2_id, m.winner_id].into_iter().flatten() {
                if !names.contains_key(&id) {
                    if let Some(user) = store.user(id).await? {
                        names.insert(id, user.full_name());
                    }
                }
            }
        }
        Ok(names)
    }
}

pub(crate) fn round_of(m: &MatchRow) -> Option<Round> {
    m.round.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_supported_field_sizes() {
        for n in [1, 2, 4, 8, 16] {
            assert!(valid_participant_count(n), "{n} should be accepted");
        }
        for n in [0, 3, 5, 6, 7, 9, 12, 15, 17, 32] {
            assert!(!valid_participant_count(n), "{n} should be rejected");
        }
    }

    #[test]
    fn first_round_matches_field_size() {
        assert_eq!(first_round_for(4), Some(Round::Semifinal));
        assert_eq!(first_round_for(8), Some(Round::Quarterfinal));
        assert_eq!(first_round_for(16), Some(Round::RoundOf8));
        assert_eq!(first_round_for(2), None);
    }

    #[test]
    fn rounds_chain_towards_the_final() {
        assert_eq!(next_round(Round::RoundOf8), Some(Round::Quarterfinal));
        assert_eq!(next_round(Round::Quarterfinal), Some(Round::Semifinal));
        assert_eq!(next_round(Round::Semifinal), Some(Round::Final));
        assert_eq!(next_round(Round::Final), None);
        assert_eq!(next_round(Round::Bronze), None);
    }

    #[test]
    fn bronze_sorts_between_semifinal_and_final() {
        assert!(Round::Semifinal.order() < Round::Bronze.order());
        assert!(Round::Bronze.order() < Round::Final.order());
    }
}

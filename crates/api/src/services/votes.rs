//! Spectator sympathy votes: one per spectator per tournament.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use infra::models::{TournamentRole, TournamentStatus, VoteRow};
use infra::store::{NewVote, RoleStore, TicketStore, VoteStore};

use crate::error::AppError;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub tournament_id: Uuid,
    pub voted_for_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnightForVotingView {
    pub id: Uuid,
    pub name: String,
    pub second_name: String,
}

pub struct VoteService {
    state: AppState,
}

impl VoteService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The ballot: all current knights, shown only to a spectator with a
    /// confirmed ticket who has not voted yet.
    pub async fn knights_for_voting(
        &self,
        tournament_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<KnightForVotingView>, AppError> {
        let store = self.state.store();

        let tournament = load_tournament(store, tournament_id).await?;
        require_status(&tournament, TournamentStatus::Active, "voting")?;

        if store
            .confirmed_ticket_of(viewer_id, tournament_id)
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden(
                "a confirmed ticket is required to vote",
            ));
        }
        if store.has_voted(viewer_id, tournament_id).await? {
            return Err(AppError::DuplicateVote);
        }

        let knights = store
            .users_with_role(tournament_id, TournamentRole::Knight)
            .await?;
        Ok(knights
            .into_iter()
            .map(|u| KnightForVotingView {
                id: u.id,
                name: u.name,
                second_name: u.second_name,
            })
            .collect())
    }

    pub async fn submit(&self, viewer_id: Uuid, req: VoteRequest) -> Result<(), AppError> {
        let store = self.state.store();

        if store.has_voted(viewer_id, req.tournament_id).await? {
            return Err(AppError::DuplicateVote);
        }

        let tournament = load_tournament(store, req.tournament_id).await?;
        require_status(&tournament, TournamentStatus::Active, "voting")?;

        if !store
            .has_role(viewer_id, req.tournament_id, TournamentRole::Spectator)
            .await?
        {
            return Err(AppError::Forbidden(
                "only spectators with a ticket can vote in this tournament",
            ));
        }
        if !store
            .has_role(req.voted_for_id, req.tournament_id, TournamentRole::Knight)
            .await?
        {
            return Err(AppError::BadRequest(
                "votes can only go to a knight of this tournament".into(),
            ));
        }
        load_user(store, req.voted_for_id).await?;

        let inserted = store
            .insert_vote(NewVote {
                voter_id: viewer_id,
                voted_for_id: req.voted_for_id,
                tournament_id: req.tournament_id,
            })
            .await?;

        match inserted {
            Some(_) => Ok(()),
            None => Err(AppError::DuplicateVote),
        }
    }

    /// The knight with the most votes, `None` without any votes.
    pub async fn winner(&self, tournament_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let votes = self
            .state
            .store()
            .votes_for_tournament(tournament_id)
            .await?;
        Ok(plurality_winner(&votes))
    }
}

/// Plurality with a deterministic tie-break: among the most-voted knights the
/// smallest id wins.
pub(crate) fn plurality_winner(votes: &[VoteRow]) -> Option<Uuid> {
    let mut counts: Vec<(Uuid, usize)> = Vec::new();
    for vote in votes {
        match counts.iter_mut().find(|(id, _)| *id == vote.voted_for_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((vote.voted_for_id, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts.first().map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn vote_for(knight: Uuid) -> VoteRow {
        VoteRow {
            id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
            voted_for_id: knight,
            tournament_id: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_votes_no_winner() {
        assert_eq!(plurality_winner(&[]), None);
    }

    #[test]
    fn most_votes_wins() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let votes = vec![vote_for(a), vote_for(b), vote_for(b)];
        assert_eq!(plurality_winner(&votes), Some(b));
    }

    #[test]
    fn ties_break_towards_the_smallest_id() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let votes = vec![
            vote_for(ids[2]),
            vote_for(ids[1]),
            vote_for(ids[1]),
            vote_for(ids[2]),
        ];
        assert_eq!(plurality_winner(&votes), Some(ids[1]));
    }
}

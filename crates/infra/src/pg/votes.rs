use async_trait::async_trait;
use uuid::Uuid;

use crate::models::VoteRow;
use crate::store::{NewVote, StoreResult, VoteStore};

use super::PgStore;

const COLUMNS: &str = "id, voter_id, voted_for_id, tournament_id, created_at";

#[async_trait]
impl VoteStore for PgStore {
    async fn insert_vote(&self, new: NewVote) -> StoreResult<Option<VoteRow>> {
        // The unique index on (voter_id, tournament_id) is the
        // double-submission guard; the duplicate yields no row.
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            r#"
            INSERT INTO votes (id, voter_id, voted_for_id, tournament_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (voter_id, tournament_id) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.voter_id)
        .bind(new.voted_for_id)
        .bind(new.tournament_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn has_voted(&self, voter_id: Uuid, tournament_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE voter_id = $1 AND tournament_id = $2)",
        )
        .bind(voter_id)
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn votes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<VoteRow>> {
        let rows = sqlx::query_as::<_, VoteRow>(&format!(
            "SELECT {COLUMNS} FROM votes WHERE tournament_id = $1 ORDER BY created_at ASC"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

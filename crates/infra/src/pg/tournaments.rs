use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{TournamentRow, TournamentStatus};
use crate::pagination::LimitOffset;
use crate::store::{NewTournament, StoreResult, TournamentStore};

use super::PgStore;

const COLUMNS: &str = "id, name, description, required_amount, prize_percent, required_knights, \
                       total_seats, event_date, status, organizer_id, created_at";

#[async_trait]
impl TournamentStore for PgStore {
    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<TournamentRow> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            r#"
            INSERT INTO tournaments
                (id, name, description, required_amount, prize_percent, required_knights,
                 total_seats, event_date, status, organizer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.description)
        .bind(new.required_amount)
        .bind(new.prize_percent)
        .bind(new.required_knights)
        .bind(new.total_seats)
        .bind(new.event_date)
        .bind(new.status.as_str())
        .bind(new.organizer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn tournament(&self, id: Uuid) -> StoreResult<Option<TournamentRow>> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_tournaments(&self, page: LimitOffset) -> StoreResult<Vec<TournamentRow>> {
        let rows = sqlx::query_as::<_, TournamentRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM tournaments
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE tournaments SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::MatchRow;
use crate::store::{MatchStore, NewMatch, StoreResult};

use super::PgStore;

const COLUMNS: &str = "id, tournament_id, round, fighter1_id, fighter2_id, winner_id, comment, \
                       fight_date, next_match_id";

#[async_trait]
impl MatchStore for PgStore {
    async fn delete_matches(&self, tournament_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM fights WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchRow> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            INSERT INTO fights
                (id, tournament_id, round, fighter1_id, fighter2_id, winner_id, comment, fight_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.tournament_id)
        .bind(new.round.as_str())
        .bind(new.fighter1_id)
        .bind(new.fighter2_id)
        .bind(new.winner_id)
        .bind(new.comment)
        .bind(new.fight_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn match_by_id(&self, id: Uuid) -> StoreResult<Option<MatchRow>> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {COLUMNS} FROM fights WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn matches_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<MatchRow>> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM fights
            WHERE tournament_id = $1
            ORDER BY seq ASC
            "#
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_match(&self, row: &MatchRow) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE fights
            SET fighter1_id = $2, fighter2_id = $3, winner_id = $4, comment = $5,
                fight_date = $6, next_match_id = $7
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(row.fighter1_id)
        .bind(row.fighter2_id)
        .bind(row.winner_id)
        .bind(row.comment.clone())
        .bind(row.fight_date)
        .bind(row.next_match_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

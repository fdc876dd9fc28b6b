use async_trait::async_trait;
use uuid::Uuid;

use crate::models::PrizeRow;
use crate::store::{NewPrize, PrizeStore, StoreResult};

use super::PgStore;

const COLUMNS: &str = "id, knight_id, tournament_id, place, amount, calculated_at";

#[async_trait]
impl PrizeStore for PgStore {
    async fn prizes_exist(&self, tournament_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM prize_distributions WHERE tournament_id = $1)",
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_prizes(&self, rows: Vec<NewPrize>) -> StoreResult<Vec<PrizeRow>> {
        // Written once per tournament, inside one transaction so a partial
        // distribution never becomes visible.
        let mut tx = self.pool.begin().await?;
        let mut out = Vec::with_capacity(rows.len());

        for new in rows {
            let row = sqlx::query_as::<_, PrizeRow>(&format!(
                r#"
                INSERT INTO prize_distributions (id, knight_id, tournament_id, place, amount)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(new.knight_id)
            .bind(new.tournament_id)
            .bind(new.place)
            .bind(new.amount)
            .fetch_one(&mut *tx)
            .await?;

            out.push(row);
        }

        tx.commit().await?;

        Ok(out)
    }

    async fn prizes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<PrizeRow>> {
        let rows = sqlx::query_as::<_, PrizeRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM prize_distributions
            WHERE tournament_id = $1
            ORDER BY amount DESC
            "#
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::TicketRow;
use crate::store::{NewTicket, StoreResult, TicketStore};

use super::{advisory_key, PgStore};

const COLUMNS: &str =
    "id, spectator_id, tournament_id, seats_count, booking_code, confirmed, created_at";

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket_checked(
        &self,
        new: NewTicket,
        total_seats: i32,
    ) -> StoreResult<Option<TicketRow>> {
        // Per-tournament advisory lock, then re-read the confirmed seat sum
        // inside the same transaction; a racing booking waits here and sees
        // the committed sum.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_key(new.tournament_id))
            .execute(&mut *tx)
            .await?;

        let already_booked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tickets
                WHERE spectator_id = $1 AND tournament_id = $2 AND confirmed
            )
            "#,
        )
        .bind(new.spectator_id)
        .bind(new.tournament_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_booked {
            tx.rollback().await?;
            return Ok(None);
        }

        let booked: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(seats_count), 0)
            FROM tickets
            WHERE tournament_id = $1 AND confirmed
            "#,
        )
        .bind(new.tournament_id)
        .fetch_one(&mut *tx)
        .await?;

        if booked as i32 + new.seats_count > total_seats {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            INSERT INTO tickets
                (id, spectator_id, tournament_id, seats_count, booking_code, confirmed)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.spectator_id)
        .bind(new.tournament_id)
        .bind(new.seats_count)
        .bind(new.booking_code)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row))
    }

    async fn confirmed_seats_sum(&self, tournament_id: Uuid) -> StoreResult<i32> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(seats_count), 0)
            FROM tickets
            WHERE tournament_id = $1 AND confirmed
            "#,
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum as i32)
    }

    async fn confirmed_ticket_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<TicketRow>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM tickets
            WHERE spectator_id = $1 AND tournament_id = $2 AND confirmed
            "#
        ))
        .bind(user_id)
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

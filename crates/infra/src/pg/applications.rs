use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ApplicationRow, ApplicationStatus};
use crate::store::{ApplicationStore, NewApplication, StoreResult};

use super::PgStore;

const COLUMNS: &str = "id, knight_id, tournament_id, status, comment, knight_name, \
                       knight_surname, height_cm, weight_kg, motivation, birth_date, \
                       coat_of_arms_url, created_at";

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(
        &self,
        new: NewApplication,
    ) -> StoreResult<Option<ApplicationRow>> {
        // ON CONFLICT DO NOTHING keeps "one application per knight per
        // tournament" atomic; no row comes back on the duplicate.
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications
                (id, knight_id, tournament_id, status, knight_name, knight_surname,
                 height_cm, weight_kg, motivation, birth_date, coat_of_arms_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (knight_id, tournament_id) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.knight_id)
        .bind(new.tournament_id)
        .bind(new.status.as_str())
        .bind(new.knight_name)
        .bind(new.knight_surname)
        .bind(new.height_cm)
        .bind(new.weight_kg)
        .bind(new.motivation)
        .bind(new.birth_date)
        .bind(new.coat_of_arms_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn application(&self, id: Uuid) -> StoreResult<Option<ApplicationRow>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn application_of(
        &self,
        knight_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<ApplicationRow>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE knight_id = $1 AND tournament_id = $2
            "#
        ))
        .bind(knight_id)
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn applications_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> StoreResult<Vec<ApplicationRow>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE tournament_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<ApplicationRow>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET status = $2, comment = $3
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn count_approved(&self, tournament_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE tournament_id = $1 AND status = $2",
        )
        .bind(tournament_id)
        .bind(ApplicationStatus::Approved.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn approved_knight_ids(&self, tournament_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT knight_id
            FROM applications
            WHERE tournament_id = $1 AND status = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tournament_id)
        .bind(ApplicationStatus::Approved.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

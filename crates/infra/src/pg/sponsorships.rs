use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{SponsorshipRow, SponsorshipStatus};
use crate::store::{NewSponsorship, SponsorshipStore, StoreResult};

use super::PgStore;

const COLUMNS: &str =
    "id, sponsor_id, tournament_id, package, amount, company_name, status, created_at";

#[async_trait]
impl SponsorshipStore for PgStore {
    async fn insert_sponsorship(&self, new: NewSponsorship) -> StoreResult<SponsorshipRow> {
        let row = sqlx::query_as::<_, SponsorshipRow>(&format!(
            r#"
            INSERT INTO sponsorships
                (id, sponsor_id, tournament_id, package, amount, company_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.sponsor_id)
        .bind(new.tournament_id)
        .bind(new.package)
        .bind(new.amount)
        .bind(new.company_name)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn confirmed_sponsor_sum(&self, tournament_id: Uuid) -> StoreResult<Decimal> {
        let sum: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM sponsorships
            WHERE tournament_id = $1 AND status = $2
            "#,
        )
        .bind(tournament_id)
        .bind(SponsorshipStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    async fn sponsorship_of(
        &self,
        sponsor_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<SponsorshipRow>> {
        let row = sqlx::query_as::<_, SponsorshipRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM sponsorships
            WHERE sponsor_id = $1 AND tournament_id = $2
            "#
        ))
        .bind(sponsor_id)
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

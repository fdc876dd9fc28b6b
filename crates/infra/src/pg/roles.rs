use std::str::FromStr;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{RoleRow, TournamentRole, UserRow};
use crate::store::{RoleStore, StoreResult};

use super::PgStore;

#[async_trait]
impl RoleStore for PgStore {
    async fn grant_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        // The primary key is (user_id, tournament_id): one role per user per
        // tournament, no matter which role the racing insert carries.
        let result = sqlx::query(
            r#"
            INSERT INTO tournament_roles (user_id, tournament_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, tournament_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(tournament_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tournament_roles
            WHERE user_id = $1 AND tournament_id = $2 AND role = $3
            "#,
        )
        .bind(user_id)
        .bind(tournament_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn roles_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Vec<TournamentRole>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT role FROM tournament_roles WHERE user_id = $1 AND tournament_id = $2",
        )
        .bind(user_id)
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names
            .iter()
            .filter_map(|name| TournamentRole::from_str(name).ok())
            .collect())
    }

    async fn has_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tournament_roles
                WHERE user_id = $1 AND tournament_id = $2 AND role = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(tournament_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn users_with_role(
        &self,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.name, u.second_name, u.organizer, u.created_at
            FROM tournament_roles r
            JOIN users u ON u.id = r.user_id
            WHERE r.tournament_id = $1 AND r.role = $2
            ORDER BY u.created_at ASC
            "#,
        )
        .bind(tournament_id)
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT user_id, tournament_id, role FROM tournament_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

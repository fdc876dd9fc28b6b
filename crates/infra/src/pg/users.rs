use async_trait::async_trait;
use uuid::Uuid;

use crate::models::UserRow;
use crate::store::{StoreResult, UserStore};

use super::PgStore;

#[async_trait]
impl UserStore for PgStore {
    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, second_name, organizer, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

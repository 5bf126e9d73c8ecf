use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Reusable per-user label. The same name may exist for different users;
/// within one user `(user_id, name)` is unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Tag {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Tag>, ApiError> {
        let rows = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name, created_at
            FROM tags
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Atomic find-or-insert on `(user_id, name)`. The no-op DO UPDATE makes
    /// the statement return the existing row instead of nothing on conflict,
    /// so concurrent same-name creates cannot race into duplicates.
    ///
    /// Takes any executor so it runs both on the pool and inside the
    /// recipe-write transaction.
    pub async fn get_or_create<'e, E>(executor: E, user_id: Uuid, name: &str) -> Result<Tag, ApiError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, name) DO UPDATE SET name = excluded.name
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(tag)
    }

    /// Owner-scoped rename. A foreign or nonexistent id is NotFound; renaming
    /// onto an existing name of the same user is a validation error.
    pub async fn rename(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Tag, ApiError> {
        let res = sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(db)
        .await;

        match res {
            Ok(Some(tag)) => Ok(tag),
            Ok(None) => Err(ApiError::NotFound),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::Validation("tag with this name already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Owner-scoped delete. Association rows go with it via FK cascade.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_displays_as_its_name() {
        let tag = Tag {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Vegan".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert_eq!(tag.to_string(), "Vegan");
    }
}

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::tags::repo::Tag;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub created_at: OffsetDateTime,
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Fields for a new recipe. Tags are plain names; each is resolved with a
/// get-or-create scoped to the owner.
#[derive(Debug)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<String>,
}

/// Partial update. `None` fields keep their current value. `tags` is three-way:
/// `None` leaves associations alone, `Some(names)` replaces the whole set
/// (so `Some(vec![])` clears it). Ownership is not part of the patch at all.
#[derive(Debug, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl Recipe {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Recipe>, ApiError> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, time_minutes, price, link, created_at
            FROM recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Owner-scoped fetch; a foreign or nonexistent id is NotFound, never 403.
    pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Recipe, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, time_minutes, price, link, created_at
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound)?;
        Ok(recipe)
    }

    /// Tags currently associated with a recipe.
    pub async fn tags<'e, E>(executor: E, recipe_id: Uuid) -> Result<Vec<Tag>, ApiError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.user_id, t.name, t.created_at
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Tag associations for all of a user's recipes in one join, keyed by
    /// recipe id. Recipes without tags simply have no entry.
    pub async fn tags_by_recipe(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, Vec<Tag>>, ApiError> {
        let rows = sqlx::query_as::<_, RecipeTagRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.user_id, t.name, t.created_at
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            JOIN recipes r ON r.id = rt.recipe_id
            WHERE r.user_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(group_by_recipe(rows))
    }

    /// Insert the recipe and resolve its tags in one transaction, so a failure
    /// partway through never leaves a recipe with half its tags.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        new: NewRecipe,
    ) -> Result<(Recipe, Vec<Tag>), ApiError> {
        let mut tx = db.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, description, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, time_minutes, price, link, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.time_minutes)
        .bind(new.price)
        .bind(&new.link)
        .fetch_one(&mut *tx)
        .await?;

        let tags = link_tags(&mut tx, user_id, recipe.id, &new.tags).await?;

        tx.commit().await?;
        Ok((recipe, tags))
    }

    /// Partial update inside one transaction. See [`RecipePatch`] for the
    /// field semantics.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        patch: RecipePatch,
    ) -> Result<(Recipe, Vec<Tag>), ApiError> {
        let mut tx = db.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                time_minutes = COALESCE($5, time_minutes),
                price = COALESCE($6, price),
                link = COALESCE($7, link)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, time_minutes, price, link, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.time_minutes)
        .bind(patch.price)
        .bind(patch.link)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound)?;

        let tags = match patch.tags {
            Some(names) => {
                sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                    .bind(recipe.id)
                    .execute(&mut *tx)
                    .await?;
                link_tags(&mut tx, user_id, recipe.id, &names).await?
            }
            None => Recipe::tags(&mut *tx, recipe.id).await?,
        };

        tx.commit().await?;
        Ok((recipe, tags))
    }

    /// Owner-scoped delete; association rows cascade, the tags stay.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
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

/// One row of the recipe_tags join: a tag plus the recipe it belongs to.
#[derive(Debug, FromRow)]
struct RecipeTagRow {
    recipe_id: Uuid,
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: OffsetDateTime,
}

fn group_by_recipe(rows: Vec<RecipeTagRow>) -> HashMap<Uuid, Vec<Tag>> {
    let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped.entry(row.recipe_id).or_default().push(Tag {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
        });
    }
    grouped
}

/// Get-or-create each named tag for the owner and associate it with the
/// recipe. Duplicate names in the payload collapse onto one row.
async fn link_tags(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    recipe_id: Uuid,
    names: &[String],
) -> Result<Vec<Tag>, ApiError> {
    let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("tag name must be set".into()));
        }
        let tag = Tag::get_or_create(&mut **tx, user_id, name).await?;
        if tags.iter().any(|t| t.id == tag.id) {
            continue;
        }
        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(tag.id)
        .execute(&mut **tx)
        .await?;
        tags.push(tag);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_displays_as_its_title() {
        let recipe = Recipe {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Sample title".into(),
            description: "Sample description".into(),
            time_minutes: 25,
            price: Decimal::new(450, 2),
            link: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert_eq!(recipe.to_string(), "Sample title");
    }

    #[test]
    fn default_patch_touches_nothing() {
        let patch = RecipePatch::default();
        assert!(patch.title.is_none());
        assert!(patch.tags.is_none());
    }

    #[test]
    fn join_rows_group_under_their_recipe() {
        let user_id = Uuid::new_v4();
        let recipe_a = Uuid::new_v4();
        let recipe_b = Uuid::new_v4();
        let row = |recipe_id, name: &str| RecipeTagRow {
            recipe_id,
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
        };

        let grouped = group_by_recipe(vec![
            row(recipe_a, "Dinner"),
            row(recipe_a, "Thai"),
            row(recipe_b, "Breakfast"),
        ]);

        assert_eq!(grouped.len(), 2);
        let names: Vec<&str> = grouped[&recipe_a].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Dinner", "Thai"]);
        assert_eq!(grouped[&recipe_b].len(), 1);
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::repo::{NewRecipe, Recipe, RecipePatch};
use crate::tags::dto::{TagInput, TagResponse};
use crate::tags::repo::Tag;

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

impl From<CreateRecipeRequest> for NewRecipe {
    fn from(req: CreateRecipeRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            time_minutes: req.time_minutes,
            price: req.price,
            link: req.link,
            tags: req.tags.into_iter().map(|t| t.name).collect(),
        }
    }
}

/// PATCH body. An absent `tags` key deserializes to `None` and leaves the
/// association set alone; `"tags": []` deserializes to `Some([])` and clears
/// it. Unknown keys, `user` included, are dropped by serde, which is what
/// keeps ownership immutable through this endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<TagInput>>,
}

impl From<UpdateRecipeRequest> for RecipePatch {
    fn from(req: UpdateRecipeRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            time_minutes: req.time_minutes,
            price: req.price,
            link: req.link,
            tags: req
                .tags
                .map(|tags| tags.into_iter().map(|t| t.name).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub created_at: OffsetDateTime,
}

impl From<(Recipe, Vec<Tag>)> for RecipeResponse {
    fn from((recipe, tags): (Recipe, Vec<Tag>)) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            created_at: recipe.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_accepts_nested_tags() {
        let req: CreateRecipeRequest = serde_json::from_str(
            r#"{
                "title": "Thai Food",
                "time_minutes": 45,
                "price": "25.50",
                "tags": [{"name": "Thai"}, {"name": "Dinner"}]
            }"#,
        )
        .unwrap();
        let new = NewRecipe::from(req);
        assert_eq!(new.tags, vec!["Thai".to_string(), "Dinner".to_string()]);
        assert_eq!(new.price, Decimal::new(2550, 2));
        assert_eq!(new.description, "");
        assert_eq!(new.link, "");
    }

    #[test]
    fn price_accepts_plain_numbers_too() {
        let req: CreateRecipeRequest = serde_json::from_str(
            r#"{"title": "Sample title", "time_minutes": 25, "price": 4.5}"#,
        )
        .unwrap();
        assert_eq!(req.price, Decimal::new(45, 1));
        assert!(req.tags.is_empty());
    }

    #[test]
    fn absent_tags_key_means_leave_associations_alone() {
        let req: UpdateRecipeRequest =
            serde_json::from_str(r#"{"title": "New Title"}"#).unwrap();
        let patch = RecipePatch::from(req);
        assert_eq!(patch.title.as_deref(), Some("New Title"));
        assert!(patch.tags.is_none());
        assert!(patch.link.is_none());
    }

    #[test]
    fn empty_tags_list_means_clear_associations() {
        let req: UpdateRecipeRequest = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        let patch = RecipePatch::from(req);
        assert_eq!(patch.tags, Some(vec![]));
    }

    #[test]
    fn user_key_in_patch_is_ignored() {
        let req: UpdateRecipeRequest = serde_json::from_str(
            r#"{"title": "New Title", "user": "5f8b1c9e-0000-0000-0000-000000000000"}"#,
        )
        .unwrap();
        let patch = RecipePatch::from(req);
        assert_eq!(patch.title.as_deref(), Some("New Title"));
        // nothing in the patch can carry an owner change
        assert!(patch.tags.is_none());
    }

    #[test]
    fn price_serializes_with_two_decimals() {
        let response = RecipeResponse {
            id: Uuid::new_v4(),
            title: "Sample title".into(),
            description: String::new(),
            time_minutes: 25,
            price: Decimal::new(450, 2),
            link: String::new(),
            tags: vec![],
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""price":"4.50""#));
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, AppJson},
    recipes::{
        dto::{CreateRecipeRequest, RecipeResponse, UpdateRecipeRequest},
        repo::Recipe,
    },
    state::AppState,
};

pub fn collection_routes() -> Router<AppState> {
    Router::new().route("/recipes", get(list_recipes).post(create_recipe))
}

pub fn detail_routes() -> Router<AppState> {
    Router::new().route(
        "/recipes/:id",
        get(get_recipe).patch(update_recipe).delete(delete_recipe),
    )
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let recipes = Recipe::list_by_user(&state.db, user_id).await?;
    let mut tags_by_recipe = Recipe::tags_by_recipe(&state.db, user_id).await?;

    let items = recipes
        .into_iter()
        .map(|recipe| {
            let tags = tags_by_recipe.remove(&recipe.id).unwrap_or_default();
            RecipeResponse::from((recipe, tags))
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("title must be set".into()));
    }
    if payload.time_minutes < 0 {
        return Err(ApiError::Validation("time_minutes must not be negative".into()));
    }
    validated_price(payload.price)?;

    let (recipe, tags) = Recipe::create(&state.db, user_id, payload.into()).await?;
    info!(user_id = %user_id, recipe_id = %recipe.id, "recipe created");
    Ok((StatusCode::CREATED, Json((recipe, tags).into())))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = Recipe::get(&state.db, user_id, id).await?;
    let tags = Recipe::tags(&state.db, recipe.id).await?;
    Ok(Json((recipe, tags).into()))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    if let Some(minutes) = payload.time_minutes {
        if minutes < 0 {
            return Err(ApiError::Validation("time_minutes must not be negative".into()));
        }
    }
    if let Some(price) = payload.price {
        validated_price(price)?;
    }

    let (recipe, tags) = Recipe::update(&state.db, user_id, id, payload.into()).await?;
    info!(user_id = %user_id, recipe_id = %recipe.id, "recipe updated");
    Ok(Json((recipe, tags).into()))
}

/// The price column is NUMERIC(5, 2): at most 999.99, at most 2 decimal
/// places. Reject out-of-range values here so they come back as a 400
/// instead of a numeric-overflow 500 from the database.
fn validated_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::Validation("price must not be negative".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(ApiError::Validation(
            "price supports at most 2 decimal places".into(),
        ));
    }
    if price >= Decimal::new(1000, 0) {
        return Err(ApiError::Validation("price must be less than 1000".into()));
    }
    Ok(price)
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    Recipe::delete(&state.db, user_id, id).await?;
    info!(user_id = %user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_over_five_digits_is_rejected() {
        let err = validated_price("123456.78".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(validated_price("1000.00".parse().unwrap()).is_err());
    }

    #[test]
    fn price_over_two_decimal_places_is_rejected() {
        let err = validated_price("4.555".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(validated_price("-4.50".parse().unwrap()).is_err());
    }

    #[test]
    fn in_range_prices_pass() {
        for ok in ["0", "4.5", "4.50", "25.50", "999.99"] {
            assert!(
                validated_price(ok.parse().unwrap()).is_ok(),
                "{ok} should be accepted"
            );
        }
        // trailing zeros beyond 2 places still fit NUMERIC(5, 2)
        assert!(validated_price("4.5000".parse().unwrap()).is_ok());
    }
}

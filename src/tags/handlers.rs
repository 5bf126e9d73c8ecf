use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, AppJson},
    state::AppState,
    tags::{
        dto::{TagInput, TagResponse},
        repo::Tag,
    },
};

pub fn list_routes() -> Router<AppState> {
    Router::new().route("/tags", get(list_tags).post(create_tag))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/tags/:id", patch(update_tag).delete(delete_tag))
}

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = Tag::list_by_user(&state.db, user_id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<TagInput>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    let name = validated_name(&payload.name)?;
    let tag = Tag::get_or_create(&state.db, user_id, name).await?;
    info!(user_id = %user_id, tag_id = %tag.id, "tag created");
    Ok((StatusCode::CREATED, Json(tag.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<TagInput>,
) -> Result<Json<TagResponse>, ApiError> {
    let name = validated_name(&payload.name)?;
    let tag = Tag::rename(&state.db, user_id, id, name).await?;
    info!(user_id = %user_id, tag_id = %tag.id, "tag renamed");
    Ok(Json(tag.into()))
}

#[instrument(skip(state))]
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    Tag::delete(&state.db, user_id, id).await?;
    info!(user_id = %user_id, tag_id = %id, "tag deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validated_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name must be set".into()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert!(validated_name("").is_err());
        assert!(validated_name("   ").is_err());
        assert_eq!(validated_name(" Vegan ").unwrap(), "Vegan");
    }
}

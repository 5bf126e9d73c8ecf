use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        jwt::{AuthUser, JwtKeys},
        password::verify_password,
    },
    error::{ApiError, AppJson},
    state::AppState,
    users::{
        dto::{CreateUserRequest, LoginRequest, TokenResponse, UpdateMeRequest, UserResponse},
        repo::{User, UserFields},
    },
};

const MIN_PASSWORD_LEN: usize = 5;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).patch(update_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    let fields = UserFields {
        name: payload.name,
        ..UserFields::default()
    };
    let user = User::create(&state.db, &payload.email, &payload.password, fields).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchanges credentials for a bearer token. Every failure path returns the
/// same 400 so callers cannot tell which factor was wrong.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.password.is_empty() {
        warn!("login with blank password");
        return Err(ApiError::InvalidCredentials);
    }

    let email = crate::users::repo::validated_email(&payload.email)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    if !user.is_active || !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(p) = payload.password.as_deref() {
        if p.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation("password too short".into()));
        }
    }

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        payload.password.as_deref(),
    )
    .await?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

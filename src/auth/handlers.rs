use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse},
    extractors::CurrentUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::{RoleRecord, User},
    role::Role,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn whoami_routes() -> Router<AppState> {
    Router::new().route("/whoami", get(whoami))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("email address is not valid".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailAlreadyTaken(payload.email));
    }

    let hash = hash_password(&payload.password)?;

    // New accounts always start as CUSTOMER, looked up by name
    let role = RoleRecord::find_by_role(&state.db, Role::Customer)
        .await?
        .ok_or_else(|| anyhow::anyhow!("CUSTOMER role is not seeded"))?;

    let user = User::create(&state.db, &payload.name, &payload.email, &hash, role.id).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user, Role::Customer)?;

    info!(user_id = user.id, email = %user.email, role = %role.name, "user registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::EmailNotRegistered(payload.email.clone())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = user.id, "login wrong password");
        return Err(ApiError::WrongPassword);
    }

    let role = user.role().ok_or_else(|| {
        anyhow::anyhow!("user {} has unrecognized role {}", user.id, user.role_name)
    })?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user, role)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn whoami(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_user(&current.user, current.role))
}

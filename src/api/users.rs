//! User registration and activation.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use super::{success, ApiJson, ApiResponse, ApiResult};
use crate::auth::hash_password_blocking;
use crate::errors::AppError;
use crate::models::{
    validate_registration, validate_token_plaintext, ActivateUserRequest, RegisterUserRequest,
    Token, TokenScope, User,
};
use crate::validator::Validator;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: User,
    pub activation_token: Token,
}

/// POST /v1/users - Register an account and issue its activation token.
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> ApiResult<RegisteredUser> {
    let mut v = Validator::new();
    validate_registration(&mut v, &request);
    v.finish().map_err(AppError::Validation)?;

    let password_hash = hash_password_blocking(request.password).await?;
    let user = state
        .repo
        .insert_user(&User {
            id: 0,
            created_at: String::new(),
            name: request.name,
            email: request.email,
            password_hash,
            activated: false,
            version: 0,
        })
        .await?;

    let activation_token = state.repo.new_token(user.id, TokenScope::Activation).await?;
    tracing::info!(user_id = user.id, "user registered");

    Ok(ApiResponse::new(RegisteredUser {
        user,
        activation_token,
    })
    .with_status(StatusCode::ACCEPTED))
}

/// PUT /v1/users/activated - Redeem an activation token.
pub async fn activate_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ActivateUserRequest>,
) -> ApiResult<User> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &request.token);
    v.finish().map_err(AppError::Validation)?;

    let mut user = state
        .repo
        .get_user_for_token(TokenScope::Activation, &request.token)
        .await?
        .ok_or_else(|| AppError::field("token", "invalid or expired activation token"))?;

    user.activated = true;
    let user = state.repo.update_user(&user).await?;

    state
        .repo
        .delete_all_tokens_for_user(TokenScope::Activation, user.id)
        .await?;
    tracing::info!(user_id = user.id, "user activated");

    success(user)
}

//! Authentication token issuing and revocation.

use axum::{extract::State, http::StatusCode, Extension};
use serde::Serialize;

use super::{success, ApiJson, ApiResponse, ApiResult, MessageResponse};
use crate::auth::{require_authenticated, verify_password_blocking, CurrentUser};
use crate::errors::AppError;
use crate::models::{
    validate_email, validate_password_plaintext, CreateAuthenticationTokenRequest, Token,
    TokenScope,
};
use crate::validator::Validator;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthenticationToken {
    pub authentication_token: Token,
}

/// POST /v1/tokens/authentication - Exchange credentials for a bearer token.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAuthenticationTokenRequest>,
) -> ApiResult<AuthenticationToken> {
    let mut v = Validator::new();
    validate_email(&mut v, &request.email);
    validate_password_plaintext(&mut v, &request.password);
    v.finish().map_err(AppError::Validation)?;

    let user = match state.repo.get_user_by_email(&request.email).await {
        Ok(user) => user,
        Err(AppError::NotFound) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e),
    };

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    let authentication_token = state
        .repo
        .new_token(user.id, TokenScope::Authentication)
        .await?;

    Ok(ApiResponse::new(AuthenticationToken {
        authentication_token,
    })
    .with_status(StatusCode::CREATED))
}

/// DELETE /v1/tokens/authentication - Revoke every bearer token of the caller.
pub async fn delete_authentication_tokens(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<MessageResponse> {
    let user = require_authenticated(&current)?;
    let revoked = state
        .repo
        .delete_all_tokens_for_user(TokenScope::Authentication, user.id)
        .await?;
    tracing::info!(user_id = user.id, revoked, "authentication tokens revoked");

    success(MessageResponse::new("authentication tokens revoked"))
}

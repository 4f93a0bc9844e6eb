//! Bearer-token authentication and the activation gate.
//!
//! [`authenticate`] resolves the `Authorization` header into a [`CurrentUser`]
//! request extension. The gates read it back; they never touch the store.

mod password;

pub use password::*;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::models::{validate_token_plaintext, TokenScope, User};
use crate::validator::Validator;
use crate::AppState;

/// Identity attached to every request that passed [`authenticate`].
#[derive(Debug, Clone)]
pub enum CurrentUser {
    Anonymous,
    User(User),
}

/// Resolve the bearer token, if any, and stash the identity in the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&state, request.headers()).await;
    let mut response = match identity {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("authorization"));
    response
}

async fn identify(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(CurrentUser::Anonymous);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(AppError::AuthenticationFailed)?;

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, token);
    if !v.valid() {
        tracing::debug!("rejected malformed bearer token");
        return Err(AppError::AuthenticationFailed);
    }

    match state
        .repo
        .get_user_for_token(TokenScope::Authentication, token)
        .await?
    {
        Some(user) => Ok(CurrentUser::User(user)),
        None => {
            tracing::debug!("rejected unknown or expired bearer token");
            Err(AppError::AuthenticationFailed)
        }
    }
}

/// Token part of a `Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty() && !token.contains(' ')).then_some(token)
}

pub fn require_authenticated(current: &CurrentUser) -> Result<&User, AppError> {
    match current {
        CurrentUser::Anonymous => Err(AppError::AuthenticationRequired),
        CurrentUser::User(user) => Ok(user),
    }
}

pub fn require_activated(current: &CurrentUser) -> Result<&User, AppError> {
    let user = require_authenticated(current)?;
    if !user.activated {
        return Err(AppError::ActivationRequired);
    }
    Ok(user)
}

/// Route layer admitting any signed-in account.
pub async fn require_authenticated_user(request: Request, next: Next) -> Response {
    match gate(&request, require_authenticated) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// Route layer admitting only activated accounts.
pub async fn require_activated_user(request: Request, next: Next) -> Response {
    match gate(&request, require_activated) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

fn gate(
    request: &Request,
    check: fn(&CurrentUser) -> Result<&User, AppError>,
) -> Result<(), AppError> {
    let anonymous = CurrentUser::Anonymous;
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .unwrap_or(&anonymous);
    check(current).map(|_| ())
}

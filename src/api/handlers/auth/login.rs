//! Password login, logout, session validation, and password change.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::context::{extract_session_token, AuthContext};

use super::error::AuthError;
use super::sessions::{clear_session_cookie, session_cookie, SessionStore};
use super::state::AuthState;
use super::storage::{lookup_user_by_id, lookup_user_by_username, update_password, UserRecord};
use super::types::{
    ChangePasswordRequest, LoginRequest, MessageResponse, SessionValidity, UserProfile,
};
use super::utils::{hash_password, valid_password, verify_password};

/// Issue a session for `user` and reply with the profile plus the session
/// cookie. Shared by password and social login.
pub(super) async fn session_response(
    sessions: &SessionStore,
    ttl_seconds: u64,
    user: UserRecord,
) -> Result<Response, AuthError> {
    let token = sessions.create_session(user.id, ttl_seconds).await?;
    let cookie = session_cookie(&token, ttl_seconds)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid cookie value: {err}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((headers, Json(UserProfile::from(user))).into_response())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = UserProfile),
        (status = 401, description = "Incorrect username or password", body = String),
        (status = 403, description = "Email not verified", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    sessions: Extension<SessionStore>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload".to_string()));
    };

    let user = lookup_user_by_username(&pool, &request.username)
        .await?
        .ok_or_else(|| {
            AuthError::AuthenticationFailed("Incorrect username or password".to_string())
        })?;

    // Social-only accounts have no hash; they fail like a wrong password.
    let password_ok = user
        .hashed_password
        .as_deref()
        .is_some_and(|hash| verify_password(&request.password, hash));
    if !password_ok {
        return Err(AuthError::AuthenticationFailed(
            "Incorrect username or password".to_string(),
        ));
    }

    if !user.is_email_verified {
        return Err(AuthError::EmailNotVerified);
    }

    session_response(&sessions, auth_state.config().session_ttl_seconds(), user).await
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session deleted, cookie cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    sessions: Extension<SessionStore>,
) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        // Idempotent: a missing session is not an error.
        if let Err(err) = sessions.delete_session(&token).await {
            error!("Failed to delete session: {err}");
        }
    }

    // Always clear the cookie, even if no server-side session existed.
    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, clear_session_cookie());
    (
        response_headers,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

#[utoipa::path(
    post,
    path = "/auth/validate-session",
    responses(
        (status = 200, description = "Whether the request carries a live session", body = SessionValidity)
    ),
    tag = "auth"
)]
pub async fn validate_session(context: Extension<AuthContext>) -> Json<SessionValidity> {
    Json(SessionValidity {
        is_valid: context.user_id.is_some(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 401, description = "No valid session", body = String),
        (status = 403, description = "Current password is incorrect", body = String)
    ),
    tag = "auth"
)]
pub async fn change_password(
    pool: Extension<PgPool>,
    context: Extension<AuthContext>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload".to_string()));
    };

    let user_id = context.user_id.ok_or_else(|| {
        AuthError::AuthenticationFailed("Invalid session or session expired".to_string())
    })?;

    if !valid_password(&request.new_password) {
        return Err(AuthError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = lookup_user_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    let current_ok = user
        .hashed_password
        .as_deref()
        .is_some_and(|hash| verify_password(&request.current_password, hash));
    if !current_ok {
        return Err(AuthError::Forbidden(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&request.new_password)?;
    update_password(&pool, user_id, &new_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

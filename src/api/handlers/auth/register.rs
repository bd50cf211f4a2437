//! Registration and email verification endpoints.

use axum::{extract::Extension, Json};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::verification_email;

use super::error::AuthError;
use super::state::AuthState;
use super::storage::{
    consume_verification_token, insert_local_user, lookup_user_by_email, set_verification_token,
    InsertUserOutcome,
};
use super::types::{
    MessageResponse, RegisterRequest, RegisterResponse, ResendVerificationEmailRequest,
    VerifyEmailRequest,
};
use super::utils::{
    generate_verification_token, hash_password, normalize_email, valid_email, valid_password,
    valid_username,
};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created, verification email sent", body = RegisterResponse),
        (status = 400, description = "Validation error or duplicate username/email", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Json<RegisterResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email".to_string()));
    }
    if !valid_username(request.username.trim()) {
        return Err(AuthError::BadRequest(
            "Username must be 3-32 characters".to_string(),
        ));
    }
    if !valid_password(&request.password) {
        return Err(AuthError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let hashed_password = hash_password(&request.password)?;
    let verification_token = generate_verification_token();

    // No pre-flight existence check: the unique indexes decide, so concurrent
    // duplicate registrations resolve to exactly one winner.
    let user = match insert_local_user(
        &pool,
        request.username.trim(),
        &email,
        &hashed_password,
        &verification_token,
    )
    .await?
    {
        InsertUserOutcome::Created(user) => user,
        InsertUserOutcome::Conflict => {
            return Err(AuthError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
    };

    let message = verification_email(
        auth_state.config().frontend_base_url(),
        &email,
        &verification_token,
    );
    auth_state.email_sender().send(&message).await?;

    Ok(Json(RegisterResponse {
        id: user.id,
        message: "Please check your email to verify your account".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired verification token", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload".to_string()));
    };

    let token = request.token.trim();
    if token.is_empty() {
        return Err(AuthError::BadRequest("Missing token".to_string()));
    }

    // Single-use: the UPDATE clears the token, so a replay matches nothing.
    if consume_verification_token(&pool, token).await? {
        Ok(Json(MessageResponse {
            message: "Email verified successfully".to_string(),
        }))
    } else {
        Err(AuthError::BadRequest(
            "Invalid or expired verification token".to_string(),
        ))
    }
}

#[utoipa::path(
    post,
    path = "/auth/resend-verification-email",
    request_body = ResendVerificationEmailRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 400, description = "Email already verified", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_verification_email(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendVerificationEmailRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    let user = lookup_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    if user.is_email_verified {
        return Err(AuthError::BadRequest("Email already verified".to_string()));
    }

    let verification_token = generate_verification_token();
    set_verification_token(&pool, user.id, &verification_token).await?;

    let message = verification_email(
        auth_state.config().frontend_base_url(),
        &email,
        &verification_token,
    );
    auth_state.email_sender().send(&message).await?;

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        let config = super::super::state::AuthConfig::new(
            "https://deepworktimer.io".to_string(),
            "gh-id".to_string(),
            SecretString::from("gh-secret".to_string()),
            "google-id".to_string(),
        );
        Arc::new(AuthState::new(
            config,
            reqwest::Client::new(),
            Arc::new(crate::api::email::LogEmailSender),
        ))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register(Extension(lazy_pool()?), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() -> Result<()> {
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                username: "alice".to_string(),
                email: "not-an-email".to_string(),
                password: "pw123456".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_short_username_and_password() -> Result<()> {
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                username: "al".to_string(),
                email: "alice@example.com".to_string(),
                password: "pw123456".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "short".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_email_empty_token() -> Result<()> {
        let response = verify_email(
            Extension(lazy_pool()?),
            Some(Json(VerifyEmailRequest {
                token: "  ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_missing_payload() -> Result<()> {
        let response = resend_verification_email(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

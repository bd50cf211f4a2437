//! Social login: GitHub authorization-code exchange and Google ID-token
//! verification.
//!
//! Both providers end the same way: the profile email is matched against the
//! local user table, the account is created or linked, and a regular session
//! cookie is issued. Google ID tokens are verified against Google's published
//! JWKS (RS256, key selected by `kid`) with audience and issuer validation;
//! tokens are never trusted unverified.

use axum::{
    extract::{Extension, Query},
    response::Response,
};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::error::AuthError;
use super::login::session_response;
use super::sessions::SessionStore;
use super::state::{AuthConfig, AuthState};
use super::storage::{
    attach_social_identity, insert_social_user, lookup_user_by_email, InsertUserOutcome,
    UserRecord,
};
use super::types::{GithubLoginQuery, GoogleLoginQuery};
use super::utils::{normalize_email, valid_username, USERNAME_MAX_LENGTH};

const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const PROVIDER_GITHUB: &str = "GITHUB";
const PROVIDER_GOOGLE: &str = "GOOGLE";

#[derive(Debug, Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubProfile {
    id: i64,
    login: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleJwks {
    keys: Vec<GoogleJwk>,
}

#[derive(Debug, Deserialize)]
struct GoogleJwk {
    kid: String,
    n: String,
    e: String,
}

#[utoipa::path(
    post,
    path = "/auth/github-login",
    params(GithubLoginQuery),
    responses(
        (status = 200, description = "Login successful, session cookie set", body = super::types::UserProfile),
        (status = 400, description = "Code exchange failed or profile unusable", body = String),
        (status = 502, description = "GitHub unreachable", body = String)
    ),
    tag = "auth"
)]
pub async fn github_login(
    pool: Extension<PgPool>,
    sessions: Extension<SessionStore>,
    auth_state: Extension<Arc<AuthState>>,
    query: Query<GithubLoginQuery>,
) -> Result<Response, AuthError> {
    let access_token =
        exchange_github_code(auth_state.http(), auth_state.config(), &query.code).await?;
    let profile = fetch_github_profile(auth_state.http(), &access_token).await?;

    let email = profile.email.as_deref().ok_or_else(|| {
        AuthError::ExternalProvider("GitHub account has no public email".to_string())
    })?;
    let email = normalize_email(email);
    let username = social_username(&profile.login, &email);

    let user = get_or_create_social_user(
        &pool,
        &email,
        &username,
        PROVIDER_GITHUB,
        &profile.id.to_string(),
    )
    .await?;

    session_response(&sessions, auth_state.config().session_ttl_seconds(), user).await
}

#[utoipa::path(
    post,
    path = "/auth/google-login",
    params(GoogleLoginQuery),
    responses(
        (status = 200, description = "Login successful, session cookie set", body = super::types::UserProfile),
        (status = 400, description = "Invalid ID token", body = String),
        (status = 502, description = "Google key set unreachable", body = String)
    ),
    tag = "auth"
)]
pub async fn google_login(
    pool: Extension<PgPool>,
    sessions: Extension<SessionStore>,
    auth_state: Extension<Arc<AuthState>>,
    query: Query<GoogleLoginQuery>,
) -> Result<Response, AuthError> {
    let claims =
        verify_google_id_token(auth_state.http(), auth_state.config(), &query.id_token).await?;

    let email = normalize_email(&claims.email);
    let username = social_username(claims.name.as_deref().unwrap_or_default(), &email);

    let user =
        get_or_create_social_user(&pool, &email, &username, PROVIDER_GOOGLE, &claims.sub).await?;

    session_response(&sessions, auth_state.config().session_ttl_seconds(), user).await
}

async fn exchange_github_code(
    http: &reqwest::Client,
    config: &AuthConfig,
    code: &str,
) -> Result<String, AuthError> {
    let params = [
        ("client_id", config.github_client_id()),
        (
            "client_secret",
            config.github_client_secret().expose_secret(),
        ),
        ("code", code),
    ];

    let response = http
        .post(GITHUB_TOKEN_URL)
        .header(ACCEPT, "application/json")
        .form(&params)
        .send()
        .await
        .map_err(|err| {
            error!("GitHub token exchange failed: {err}");
            AuthError::ServiceUnavailable("Identity provider unreachable".to_string())
        })?;

    let token: GithubTokenResponse = response.json().await.map_err(|err| {
        error!("GitHub token response unreadable: {err}");
        AuthError::ExternalProvider("Failed to obtain access token".to_string())
    })?;

    token
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::ExternalProvider("Failed to obtain access token".to_string()))
}

async fn fetch_github_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> Result<GithubProfile, AuthError> {
    let response = http
        .get(GITHUB_USER_URL)
        .bearer_auth(access_token)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|err| {
            error!("GitHub profile fetch failed: {err}");
            AuthError::ServiceUnavailable("Identity provider unreachable".to_string())
        })?;

    response.json().await.map_err(|err| {
        error!("GitHub profile unreadable: {err}");
        AuthError::ExternalProvider("Failed to fetch GitHub profile".to_string())
    })
}

async fn verify_google_id_token(
    http: &reqwest::Client,
    config: &AuthConfig,
    id_token: &str,
) -> Result<GoogleClaims, AuthError> {
    let header = decode_header(id_token)
        .map_err(|_| AuthError::ExternalProvider("Invalid ID token".to_string()))?;
    let kid = header
        .kid
        .ok_or_else(|| AuthError::ExternalProvider("Invalid ID token".to_string()))?;

    let jwks: GoogleJwks = http
        .get(GOOGLE_JWKS_URL)
        .send()
        .await
        .map_err(|err| {
            error!("Google JWKS fetch failed: {err}");
            AuthError::ServiceUnavailable("Identity provider unreachable".to_string())
        })?
        .json()
        .await
        .map_err(|err| {
            error!("Google JWKS unreadable: {err}");
            AuthError::ServiceUnavailable("Identity provider unreachable".to_string())
        })?;

    let jwk = select_jwk(&jwks.keys, &kid)
        .ok_or_else(|| AuthError::ExternalProvider("Unknown signing key".to_string()))?;
    let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
        .map_err(|_| AuthError::ExternalProvider("Invalid signing key".to_string()))?;

    decode::<GoogleClaims>(id_token, &key, &google_validation(config.google_client_id()))
        .map(|data| data.claims)
        .map_err(|_| AuthError::ExternalProvider("Invalid ID token".to_string()))
}

/// RS256 with the configured client id as audience and Google's two issuer
/// spellings accepted.
fn google_validation(client_id: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&GOOGLE_ISSUERS);
    validation
}

fn select_jwk<'a>(keys: &'a [GoogleJwk], kid: &str) -> Option<&'a GoogleJwk> {
    keys.iter().find(|key| key.kid == kid)
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Derive a username that satisfies the local length policy from whatever the
/// provider supplied. Falls back to the email local part, then the full email.
fn social_username(candidate: &str, email: &str) -> String {
    for name in [candidate.trim(), local_part(email), email] {
        let clamped: String = name.chars().take(USERNAME_MAX_LENGTH).collect();
        if valid_username(&clamped) {
            return clamped;
        }
    }
    email.to_string()
}

/// Match by email: link the social identity onto an existing account, or
/// create a new verified one.
async fn get_or_create_social_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    provider: &str,
    social_id: &str,
) -> Result<UserRecord, AuthError> {
    if let Some(user) = lookup_user_by_email(pool, email).await? {
        return Ok(attach_social_identity(pool, user.id, provider, social_id).await?);
    }

    match insert_social_user(pool, username, email, provider, social_id).await? {
        InsertUserOutcome::Created(user) => Ok(user),
        // Username taken by a different email; surfaced rather than renamed.
        InsertUserOutcome::Conflict => Err(AuthError::Conflict(
            "Username or email already exists".to_string(),
        )),
    }
}

//! Database helpers for user accounts and verification state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// User row as handlers see it. The verification token is never selected; it
/// only travels through the dedicated token queries below. Handlers convert
/// this into a response view before anything leaves the process; the hash
/// never does.
#[derive(Debug, Clone)]
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) hashed_password: Option<String>,
    pub(super) is_email_verified: bool,
    pub(super) social_provider: Option<String>,
    pub(super) social_id: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

/// Outcome when inserting a new user; duplicates surface as `Conflict` via the
/// unique indexes rather than a pre-flight check, so two concurrent
/// registrations cannot both succeed.
#[derive(Debug)]
pub(super) enum InsertUserOutcome {
    Created(UserRecord),
    Conflict,
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
        is_email_verified: row.get("is_email_verified"),
        social_provider: row.get("social_provider"),
        social_id: row.get("social_id"),
        created_at: row.get("created_at"),
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

pub(super) async fn lookup_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, hashed_password, is_email_verified,
               social_provider, social_id, created_at
        FROM users
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by username")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn lookup_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, hashed_password, is_email_verified,
               social_provider, social_id, created_at
        FROM users
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by email")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn lookup_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, hashed_password, is_email_verified,
               social_provider, social_id, created_at
        FROM users
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by id")?;
    Ok(row.as_ref().map(user_from_row))
}

/// Insert a local (password) user, unverified, with its verification token.
pub(super) async fn insert_local_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    hashed_password: &str,
    verification_token: &str,
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users
            (username, email, hashed_password, is_email_verified, email_verification_token)
        VALUES ($1, $2, $3, FALSE, $4)
        RETURNING id, username, email, hashed_password, is_email_verified,
                  social_provider, social_id, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .bind(verification_token)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertUserOutcome::Created(user_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Insert a social-login user. Created verified: the provider already proved
/// control of the email address.
pub(super) async fn insert_social_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    provider: &str,
    social_id: &str,
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users
            (username, email, is_email_verified, social_provider, social_id)
        VALUES ($1, $2, TRUE, $3, $4)
        RETURNING id, username, email, hashed_password, is_email_verified,
                  social_provider, social_id, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(provider)
        .bind(social_id)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertUserOutcome::Created(user_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert social user"),
    }
}

/// Attach or refresh a social identity on an existing account and mark the
/// email verified.
pub(super) async fn attach_social_identity(
    pool: &PgPool,
    user_id: Uuid,
    provider: &str,
    social_id: &str,
) -> Result<UserRecord> {
    let query = r"
        UPDATE users
        SET social_provider = $2,
            social_id = $3,
            is_email_verified = TRUE,
            email_verification_token = NULL
        WHERE id = $1
        RETURNING id, username, email, hashed_password, is_email_verified,
                  social_provider, social_id, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(provider)
        .bind(social_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to attach social identity")?;
    Ok(user_from_row(&row))
}

/// Consume a verification token: mark the user verified and clear the token in
/// one statement, so a replay of the same token matches zero rows.
pub(super) async fn consume_verification_token(pool: &PgPool, token: &str) -> Result<bool> {
    let query = r"
        UPDATE users
        SET is_email_verified = TRUE,
            email_verification_token = NULL
        WHERE email_verification_token = $1
          AND is_email_verified = FALSE
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;
    Ok(row.is_some())
}

/// Replace the verification token for a not-yet-verified user (resend flow).
pub(super) async fn set_verification_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET email_verification_token = $2
        WHERE id = $1
          AND is_email_verified = FALSE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to set verification token")?;
    Ok(())
}

/// Replace the password hash. Single statement, so the swap is atomic.
pub(super) async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    hashed_password: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET hashed_password = $2
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(hashed_password)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;
    Ok(())
}

//! Request/response types for auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::storage::UserRecord;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationEmailRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(IntoParams, Deserialize, Debug)]
#[into_params(parameter_in = Query)]
pub struct GithubLoginQuery {
    /// Authorization code returned by GitHub's OAuth redirect.
    pub code: String,
}

#[derive(IntoParams, Deserialize, Debug)]
#[into_params(parameter_in = Query)]
pub struct GoogleLoginQuery {
    /// Google ID token obtained by the frontend.
    pub id_token: String,
}

/// Public view of a user. Built from a [`UserRecord`] and by construction never
/// carries the password hash or the verification token.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
    pub social_provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_email_verified: user.is_email_verified,
            social_provider: user.social_provider,
            created_at: user.created_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionValidity {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            username: "alice".to_string(),
            password: "pw123456".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let username = value
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        let decoded: LoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "pw123456");
        Ok(())
    }

    #[test]
    fn session_validity_uses_camel_case_key() -> Result<()> {
        let value = serde_json::to_value(SessionValidity { is_valid: true })?;
        assert_eq!(value.get("isValid"), Some(&serde_json::Value::Bool(true)));
        Ok(())
    }

    #[test]
    fn user_profile_never_exposes_password_hash() -> Result<()> {
        let user = UserRecord {
            id: Uuid::nil(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: Some("$argon2id$v=19$secret".to_string()),
            is_email_verified: true,
            social_provider: None,
            social_id: None,
            created_at: Utc::now(),
        };
        let profile = UserProfile::from(user);
        let json = serde_json::to_string(&profile)?;
        assert!(!json.contains("argon2"));
        assert!(!json.contains("hashed_password"));
        Ok(())
    }
}

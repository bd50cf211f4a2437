//! Error taxonomy for auth endpoints, mapped onto HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the auth handlers. None of these are retried; each maps
/// directly to an HTTP response with a short message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input.
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials or an invalid/expired session.
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Correct credentials but the account email is not verified yet.
    /// Deliberately distinct from a bad password.
    #[error("Email not verified")]
    EmailNotVerified,

    /// Authenticated but not allowed, e.g. wrong current password.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate username/email. Reported as 400, matching the public API
    /// contract rather than 409.
    #[error("{0}")]
    Conflict(String),

    /// The identity provider rejected or returned unusable data.
    #[error("{0}")]
    ExternalProvider(String),

    /// The identity provider could not be reached.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Anything else; detail is logged, clients get a generic message.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message)
            | Self::Conflict(message)
            | Self::ExternalProvider(message) => (StatusCode::BAD_REQUEST, message),
            Self::AuthenticationFailed(message) => (StatusCode::UNAUTHORIZED, message),
            Self::EmailNotVerified => (StatusCode::FORBIDDEN, "Email not verified".to_string()),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::ServiceUnavailable(message) => (StatusCode::BAD_GATEWAY, message),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn status_of(err: AuthError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn bad_request_family_maps_to_400() {
        assert_eq!(
            status_of(AuthError::BadRequest("missing".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::Conflict("duplicate".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::ExternalProvider("bad token".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn authentication_failed_maps_to_401() {
        assert_eq!(
            status_of(AuthError::AuthenticationFailed("nope".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unverified_email_is_distinct_403() {
        assert_eq!(status_of(AuthError::EmailNotVerified), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::Forbidden("wrong password".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            status_of(AuthError::NotFound("no such user".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn provider_outage_maps_to_502() {
        assert_eq!(
            status_of(AuthError::ServiceUnavailable("unreachable".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn internal_hides_detail() {
        let response = AuthError::Internal(anyhow!("pool exhausted")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

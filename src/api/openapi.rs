//! `OpenAPI` document served through Swagger UI at `/docs`.

use utoipa::OpenApi;

use super::handlers::{auth, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::register::verify_email,
        auth::register::resend_verification_email,
        auth::login::login,
        auth::login::logout,
        auth::login::validate_session,
        auth::login::change_password,
        auth::oauth::github_login,
        auth::oauth::google_login,
    ),
    components(schemas(
        health::Health,
        auth::types::RegisterRequest,
        auth::types::RegisterResponse,
        auth::types::VerifyEmailRequest,
        auth::types::ResendVerificationEmailRequest,
        auth::types::LoginRequest,
        auth::types::ChangePasswordRequest,
        auth::types::UserProfile,
        auth::types::MessageResponse,
        auth::types::SessionValidity,
    )),
    tags(
        (name = "auth", description = "Accounts, sessions, and social login"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_documents_all_routes() {
        let spec = ApiDoc::openapi();
        for path in [
            "/health",
            "/auth/register",
            "/auth/verify-email",
            "/auth/resend-verification-email",
            "/auth/login",
            "/auth/logout",
            "/auth/validate-session",
            "/auth/change-password",
            "/auth/github-login",
            "/auth/google-login",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

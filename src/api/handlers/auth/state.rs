//! Auth configuration and shared state.

use secrecy::SecretString;
use std::sync::Arc;

use crate::api::email::EmailSender;

use super::sessions::SESSION_TTL_SECONDS;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: u64,
    github_client_id: String,
    github_client_secret: SecretString,
    google_client_id: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        frontend_base_url: String,
        github_client_id: String,
        github_client_secret: SecretString,
        google_client_id: String,
    ) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: SESSION_TTL_SECONDS,
            github_client_id,
            github_client_secret,
            google_client_id,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    pub(super) fn github_client_id(&self) -> &str {
        &self.github_client_id
    }

    pub(super) fn github_client_secret(&self) -> &SecretString {
        &self.github_client_secret
    }

    pub(super) fn google_client_id(&self) -> &str {
        &self.google_client_id
    }
}

/// Shared auth state: immutable configuration, the outbound HTTP client used
/// for OAuth exchanges, and the email sender.
pub struct AuthState {
    config: AuthConfig,
    http: reqwest::Client,
    email: Arc<dyn EmailSender>,
}

impl AuthState {
    pub fn new(config: AuthConfig, http: reqwest::Client, email: Arc<dyn EmailSender>) -> Self {
        Self {
            config,
            http,
            email,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(super) fn email_sender(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://deepworktimer.io".to_string(),
            "gh-id".to_string(),
            SecretString::from("gh-secret".to_string()),
            "google-id".to_string(),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = config();
        assert_eq!(config.frontend_base_url(), "https://deepworktimer.io");
        assert_eq!(config.session_ttl_seconds(), SESSION_TTL_SECONDS);
        assert_eq!(config.github_client_id(), "gh-id");
        assert_eq!(config.google_client_id(), "google-id");

        let config = config.with_session_ttl_seconds(60);
        assert_eq!(config.session_ttl_seconds(), 60);
    }

    #[test]
    fn auth_state_exposes_parts() {
        let state = AuthState::new(config(), reqwest::Client::new(), Arc::new(LogEmailSender));
        assert_eq!(state.config().github_client_id(), "gh-id");
    }
}

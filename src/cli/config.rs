use secrecy::SecretString;

/// Immutable runtime configuration, built once from the CLI/environment and
/// passed by reference to the components that need it.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub dsn: String,
    pub redis_url: String,
    /// Base URL of the frontend; used for CORS and verification links.
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub github_client_id: String,
    pub github_client_secret: SecretString,
    pub google_client_id: String,
    /// When absent, outbound email is logged instead of delivered.
    pub brevo_api_key: Option<SecretString>,
    pub brevo_sender_email: String,
    pub brevo_sender_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_holds_values() {
        let config = Config {
            port: 8080,
            dsn: "postgres://localhost/deepwork".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            frontend_url: "https://deepworktimer.io".to_string(),
            allowed_origins: vec!["https://deepworktimer.io".to_string()],
            github_client_id: "gh-id".to_string(),
            github_client_secret: SecretString::from("gh-secret".to_string()),
            google_client_id: "google-id".to_string(),
            brevo_api_key: None,
            brevo_sender_email: "noreply@deepworktimer.io".to_string(),
            brevo_sender_name: "Deep Work Timer".to_string(),
        };

        assert_eq!(config.port, 8080);
        assert_eq!(config.github_client_secret.expose_secret(), "gh-secret");
        assert!(config.brevo_api_key.is_none());
        // Secrets must not leak through Debug output
        let debug = format!("{config:?}");
        assert!(!debug.contains("gh-secret"));
    }
}

//! HTTP server assembly: database and session store connections, CORS,
//! tracing, and the auth routes.

use crate::{cli::config::Config, APP_USER_AGENT};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod context;
pub mod email;
pub mod handlers;
mod openapi;

use handlers::auth::{self, AuthConfig, AuthState, SessionStore};

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&config.dsn)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let sessions = SessionStore::new(&config.redis_url)?;
    sessions
        .ping()
        .await
        .context("Failed to reach session store")?;

    let http = reqwest::Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let email: Arc<dyn email::EmailSender> = match config.brevo_api_key {
        Some(api_key) => Arc::new(email::BrevoEmailSender::new(
            http.clone(),
            api_key,
            config.brevo_sender_email,
            config.brevo_sender_name,
        )),
        None => {
            info!("No email API key configured, outbound email will be logged");
            Arc::new(email::LogEmailSender)
        }
    };

    let auth_config = AuthConfig::new(
        config.frontend_url,
        config.github_client_id,
        config.github_client_secret,
        config.google_client_id,
    );
    let auth_state = Arc::new(AuthState::new(auth_config, http, email));

    let origins = allowed_origins(&config.allowed_origins)?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true);

    let app = router()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(sessions))
                .layer(Extension(pool))
                .layer(axum::middleware::from_fn(context::auth_context)),
        );

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(auth::register::register))
        .route("/auth/verify-email", post(auth::register::verify_email))
        .route(
            "/auth/resend-verification-email",
            post(auth::register::resend_verification_email),
        )
        .route("/auth/login", post(auth::login::login))
        .route("/auth/logout", post(auth::login::logout))
        .route("/auth/validate-session", post(auth::login::validate_session))
        .route("/auth/change-password", post(auth::login::change_password))
        .route("/auth/github-login", post(auth::oauth::github_login))
        .route("/auth/google-login", post(auth::oauth::google_login))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Normalize configured origins to `scheme://host[:port]` header values.
fn allowed_origins(origins: &[String]) -> Result<Vec<HeaderValue>> {
    origins.iter().map(|origin| parse_origin(origin)).collect()
}

fn parse_origin(origin: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(origin).with_context(|| format!("Invalid allowed origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Allowed origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let value = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&value).context("Failed to build origin header")
}

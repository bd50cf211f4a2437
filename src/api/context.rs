//! Per-request authentication context.
//!
//! The middleware resolves the session cookie against the session store once,
//! before routing, and stores the outcome in request extensions. Handlers that
//! need the caller read [`AuthContext`]; the middleware never rejects, so
//! endpoints like validate-session can answer for anonymous callers too.

use axum::{
    extract::{Extension, Request},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::error;
use uuid::Uuid;

use crate::api::handlers::auth::{SessionStore, SESSION_COOKIE_NAME};

/// Who is making this request, if anyone.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    pub user_id: Option<Uuid>,
}

/// Pull the session token out of the `Cookie` header.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE_NAME && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Resolve the session cookie and attach an [`AuthContext`] to the request.
pub async fn auth_context(
    Extension(sessions): Extension<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match extract_session_token(request.headers()) {
        Some(token) => match sessions.get_user_id(&token).await {
            Ok(user_id) => user_id,
            // Store outage degrades to anonymous rather than failing the request.
            Err(err) => {
                error!("Failed to resolve session: {err}");
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(AuthContext { user_id });
    next.run(request).await
}

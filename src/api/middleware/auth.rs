use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    error::AppError,
};

pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller, as seen by handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user_id: i64,
    pub user_name: String,
}

/// Session token from the `session` cookie, or failing that from an
/// `Authorization: Bearer` header.
fn session_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, &request).ok_or(AppError::Unauthorized)?;

    let session = state
        .service_context
        .auth_service
        .validate_session(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Insert current user into request extensions
    request.extensions_mut().insert(CurrentUser {
        user_id: session.user_id,
        user_name: session.user_name,
    });

    Ok(next.run(request).await)
}

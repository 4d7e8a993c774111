use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::errors::AuthError;
use crate::auth::guard;
use crate::auth::models::AccessClaims;
use crate::auth::models::Principal;
use crate::inbound::http::cookies::ACCESS_COOKIE;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::required_roles;
use crate::inbound::http::router::AppState;

/// Middleware that verifies the access token and materializes a principal.
///
/// Signature and expiry are checked here by the codec; the service then
/// confirms the account still exists. Any failure collapses into one
/// unauthorized response.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(&req).ok_or_else(|| unauthorized())?;

    let claims: AccessClaims = state.access_codec.decode(&token).map_err(|e| {
        tracing::debug!("Access token rejected: {e}");
        unauthorized()
    })?;

    let principal = state
        .auth_service
        .validate_access(&claims)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound(_) => unauthorized(),
            other => ApiError::from(other).into_response(),
        })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Middleware that applies the access-control guard against the route's
/// declared role requirement.
///
/// Runs after `authenticate` on protected routes, but tolerates an absent
/// principal so it can also sit in front of principal-optional routes.
pub async fn authorize(req: Request, next: Next) -> Result<Response, Response> {
    let principal = req.extensions().get::<Principal>();
    let required = required_roles(req.uri().path());

    if !guard::is_allowed(principal, required) {
        if principal.is_none() {
            return Err(unauthorized());
        }
        return Err(ApiError::Forbidden("Forbidden".to_string()).into_response());
    }

    Ok(next.run(req).await)
}

fn unauthorized() -> Response {
    ApiError::Unauthorized("Unauthorized".to_string()).into_response()
}

/// Cookie first, then Authorization header.
fn extract_token(req: &Request) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let header = req.headers().get(http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::cookies::clear_auth_cookies;
use crate::inbound::http::router::AppState;

/// Drop both auth cookies. Stateless by design: the refresh record dies on
/// its own expiry, and the access token was never server-side state.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ApiSuccess<LogoutData>) {
    let jar = clear_auth_cookies(jar, state.secure_cookies);
    (
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            LogoutData {
                message: "Logged out".to_string(),
            },
        ),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutData {
    pub message: String,
}

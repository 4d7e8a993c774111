use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::inbound::http::cookies::set_auth_cookies;
use crate::inbound::http::cookies::REFRESH_COOKIE;
use crate::inbound::http::router::AppState;

/// The token may arrive in the JSON body (API clients) or in the
/// path-scoped refresh cookie (browsers).
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequestBody>>,
) -> Result<(CookieJar, ApiSuccess<TokenPairData>), ApiError> {
    let presented = body
        .and_then(|Json(body)| body.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let pair = state.auth_service.refresh(&presented).await?;

    let jar = set_auth_cookies(jar, &pair, state.secure_cookies);
    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, TokenPairData::from(&pair)),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequestBody {
    refresh_token: Option<String>,
}

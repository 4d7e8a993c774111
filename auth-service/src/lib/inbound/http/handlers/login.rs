use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::auth::models::LoginCommand;
use crate::inbound::http::cookies::set_auth_cookies;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequestBody>,
) -> Result<(CookieJar, ApiSuccess<TokenPairData>), ApiError> {
    let command = LoginCommand {
        email: body.email,
        password: body.password,
    };

    let pair = state.auth_service.login(command).await?;

    let jar = set_auth_cookies(jar, &pair, state.secure_cookies);
    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, TokenPairData::from(&pair)),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: String,
    password: String,
}

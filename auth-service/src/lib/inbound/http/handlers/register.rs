use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::auth::models::EmailAddress;
use crate::auth::models::RegisterCommand;
use crate::inbound::http::cookies::set_auth_cookies;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequestBody>,
) -> Result<(CookieJar, ApiSuccess<TokenPairData>), ApiError> {
    let email = EmailAddress::new(body.email)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let command = RegisterCommand::new(email, body.password, body.roles.unwrap_or_default());

    let pair = state.auth_service.register(command).await?;

    let jar = set_auth_cookies(jar, &pair, state.secure_cookies);
    Ok((
        jar,
        ApiSuccess::new(StatusCode::CREATED, TokenPairData::from(&pair)),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    email: String,
    password: String,
    roles: Option<Vec<String>>,
}

use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::auth::models::Principal;
use crate::auth::models::Role;

/// Echo the authenticated principal, as materialized by the middleware.
pub async fn me(
    Extension(principal): Extension<Principal>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, (&principal).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalData {
    pub user_id: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<&Principal> for PrincipalData {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id.to_string(),
            email: principal.email.clone(),
            roles: principal.roles.clone(),
        }
    }
}

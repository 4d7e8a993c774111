use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for TokenId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for role name parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unrecognized role: {0}")]
    Unrecognized(String),
}

/// Top-level error for all credential and session operations.
///
/// Domain variants are expected outcomes surfaced to the caller as
/// structured failures; `StoreUnavailable` is an infrastructure fault worth
/// incident-level logging, and `Internal` covers primitive faults that
/// should never happen in a healthy deployment.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Invalid roles: {0}")]
    InvalidRole(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

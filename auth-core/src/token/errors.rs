use thiserror::Error;

/// Error type for token operations.
///
/// `Expired` and `Invalid` exist as separate variants for internal logging
/// only; at the network boundary both collapse into one unauthorized signal
/// so a caller cannot tell a forged token from a stale one.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(String),
}

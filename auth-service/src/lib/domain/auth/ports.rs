use async_trait::async_trait;

use crate::auth::errors::AuthError;
use crate::auth::models::AccessClaims;
use crate::auth::models::AuthUser;
use crate::auth::models::LoginCommand;
use crate::auth::models::Principal;
use crate::auth::models::RefreshTokenRecord;
use crate::auth::models::RegisterCommand;
use crate::auth::models::TokenId;
use crate::auth::models::TokenPair;
use crate::auth::models::UserId;

/// Port for the credential issuance and session lifecycle workflows.
///
/// The HTTP layer consumes this surface through a trait object; the concrete
/// service is constructed once at startup with whichever store the
/// configuration selected.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account and issue its first token pair.
    ///
    /// # Errors
    /// * `DuplicateEmail` - the email is already registered
    /// * `InvalidRole` - a requested role is outside the closed enumeration
    /// * `StoreUnavailable` - store transport failed
    async fn register(&self, command: RegisterCommand) -> Result<TokenPair, AuthError>;

    /// Verify credentials and issue a token pair.
    ///
    /// Absent account and wrong password both yield `InvalidCredentials`,
    /// with identical shape, so accounts cannot be enumerated.
    ///
    /// # Errors
    /// * `InvalidCredentials` - unknown email or password mismatch
    /// * `StoreUnavailable` - store transport failed
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError>;

    /// Rotate a refresh token: consume the presented one, issue a new pair.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - bad signature, unknown record, or hash mismatch
    /// * `RefreshTokenExpired` - the persisted record's expiry has passed
    /// * `UserNotFound` - the owning account no longer exists
    /// * `StoreUnavailable` - store transport failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Materialize a request-scoped principal from already-verified claims.
    ///
    /// Does not re-verify the signature; it only confirms the account still
    /// exists, covering deletion after issuance.
    ///
    /// # Errors
    /// * `UserNotFound` - the account was deleted after the token was issued
    /// * `StoreUnavailable` - store transport failed
    async fn validate_access(&self, claims: &AccessClaims) -> Result<Principal, AuthError>;
}

/// Persistence operations for user and refresh-token records.
///
/// The store exclusively owns this state; the service is stateless between
/// calls. All operations may fail with `StoreUnavailable` on transport
/// failure.
#[async_trait]
pub trait AuthRepository: Send + Sync + 'static {
    /// Retrieve a user by email, matched case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Retrieve a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<AuthUser>, AuthError>;

    /// Insert-or-update a user by id.
    ///
    /// Idempotent upsert; safe to retry after an abandoned call.
    ///
    /// # Errors
    /// * `DuplicateEmail` - the email belongs to a different user
    async fn save_user(&self, user: AuthUser) -> Result<(), AuthError>;

    /// Insert a refresh-token record. The caller guarantees token-id
    /// uniqueness (ids are generated fresh per issuance).
    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Retrieve a refresh-token record by its composite key.
    async fn find_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Delete a refresh-token record.
    ///
    /// Idempotent: deleting an absent record is a no-op, so concurrent
    /// replays of the same token both fail closed.
    async fn revoke_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<(), AuthError>;
}

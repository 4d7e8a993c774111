use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_core::PasswordHasher;
use auth_core::TokenCodec;
use auth_core::TokenError;
use chrono::DateTime;
use chrono::Utc;

use crate::auth::errors::AuthError;
use crate::auth::models::AccessClaims;
use crate::auth::models::AuthUser;
use crate::auth::models::LoginCommand;
use crate::auth::models::Principal;
use crate::auth::models::RefreshClaims;
use crate::auth::models::RefreshTokenRecord;
use crate::auth::models::RegisterCommand;
use crate::auth::models::Role;
use crate::auth::models::TokenId;
use crate::auth::models::TokenPair;
use crate::auth::models::UserId;
use crate::auth::ports::AuthRepository;
use crate::auth::ports::AuthServicePort;

/// Orchestrator for the register/login/refresh/validate workflows.
///
/// Holds no persistent state of its own; everything durable lives behind
/// the repository port, which keeps replicas interchangeable.
pub struct AuthService<R>
where
    R: AuthRepository,
{
    repository: Arc<R>,
    password_hasher: PasswordHasher,
    access_codec: TokenCodec,
    refresh_codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl<R> AuthService<R>
where
    R: AuthRepository,
{
    /// Create a new auth service.
    ///
    /// Access and refresh tokens are signed with independent secrets; the
    /// two TTLs are each parsed once by the caller and shared between the
    /// signed expiry and the persisted record expiry.
    pub fn new(
        repository: Arc<R>,
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            password_hasher: PasswordHasher::new(),
            access_codec: TokenCodec::new(access_secret),
            refresh_codec: TokenCodec::new(refresh_secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Validate requested role names against the closed enumeration.
    ///
    /// An empty request defaults to the baseline role. Unrecognized names
    /// are all reported in one error.
    fn normalize_roles(roles: &[String]) -> Result<Vec<Role>, AuthError> {
        if roles.is_empty() {
            return Ok(vec![Role::BASELINE]);
        }

        let trimmed: Vec<&str> = roles.iter().map(|role| role.trim()).collect();
        let invalid: Vec<&str> = trimmed
            .iter()
            .copied()
            .filter(|role| role.parse::<Role>().is_err())
            .collect();

        if !invalid.is_empty() {
            return Err(AuthError::InvalidRole(invalid.join(", ")));
        }

        Ok(trimmed
            .iter()
            .filter_map(|role| role.parse::<Role>().ok())
            .collect())
    }

    /// Argon2 is deliberately slow; run it off the async workers so one
    /// hashing call cannot stall unrelated requests.
    async fn hash_blocking(&self, secret: String) -> Result<String, AuthError> {
        let hasher = self.password_hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn compare_blocking(&self, secret: String, digest: String) -> Result<bool, AuthError> {
        let hasher = self.password_hasher;
        tokio::task::spawn_blocking(move || hasher.compare(&secret, &digest))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Issue a fresh access/refresh pair for a user.
    ///
    /// The persisted record stores a hash of the signed refresh token
    /// string itself, and its expiry is computed from the same TTL that
    /// went into the signature.
    async fn issue_tokens(&self, user: &AuthUser) -> Result<TokenPair, AuthError> {
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.as_str().to_string(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: expiry(now, self.access_ttl).timestamp(),
        };
        let access_token = self
            .access_codec
            .encode(&access_claims)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let token_id = TokenId::new();
        let expires_at = expiry(now, self.refresh_ttl);
        let refresh_claims = RefreshClaims {
            sub: user.id.to_string(),
            jti: token_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let refresh_token = self
            .refresh_codec
            .encode(&refresh_claims)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let hashed_token = self.hash_blocking(refresh_token.clone()).await?;

        self.repository
            .save_refresh_token(RefreshTokenRecord {
                user_id: user.id,
                token_id,
                hashed_token,
                expires_at,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + chrono::Duration::seconds(ttl.as_secs() as i64)
}

#[async_trait]
impl<R> AuthServicePort for AuthService<R>
where
    R: AuthRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<TokenPair, AuthError> {
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail(command.email.to_string()));
        }

        let roles = Self::normalize_roles(&command.roles)?;
        let password_hash = self.hash_blocking(command.password).await?;

        let user = AuthUser {
            id: UserId::new(),
            email: command.email,
            password_hash,
            roles,
        };

        self.repository.save_user(user.clone()).await?;

        tracing::info!(user_id = %user.id, "Account registered");

        self.issue_tokens(&user).await
    }

    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError> {
        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = self
            .compare_blocking(command.password, user.password_hash.clone())
            .await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(&user).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims: RefreshClaims = self.refresh_codec.decode(refresh_token).map_err(|e| {
            match e {
                TokenError::Expired => tracing::debug!("Refresh token signature expired"),
                _ => tracing::debug!("Refresh token rejected: {e}"),
            }
            AuthError::InvalidRefreshToken
        })?;

        let user_id =
            UserId::from_string(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;
        let token_id =
            TokenId::from_string(&claims.jti).map_err(|_| AuthError::InvalidRefreshToken)?;

        let Some(record) = self
            .repository
            .find_refresh_token(&user_id, &token_id)
            .await?
        else {
            return Err(AuthError::InvalidRefreshToken);
        };

        if record.expires_at < Utc::now() {
            self.repository
                .revoke_refresh_token(&user_id, &token_id)
                .await?;
            tracing::debug!(user_id = %user_id, "Expired refresh token record removed");
            return Err(AuthError::RefreshTokenExpired);
        }

        // The stored hash covers the signed token string, not just its
        // claims, so a record outliving a leaked signing secret is still
        // useless without the original bearer string.
        let is_valid = self
            .compare_blocking(refresh_token.to_string(), record.hashed_token)
            .await?;
        if !is_valid {
            return Err(AuthError::InvalidRefreshToken);
        }

        // Rotation invariant: consume the presented token before issuing a
        // replacement. A replay after this point finds no record.
        self.repository
            .revoke_refresh_token(&user_id, &token_id)
            .await?;

        let Some(user) = self.repository.find_by_id(&user_id).await? else {
            return Err(AuthError::UserNotFound(user_id.to_string()));
        };

        self.issue_tokens(&user).await
    }

    async fn validate_access(&self, claims: &AccessClaims) -> Result<Principal, AuthError> {
        let user_id = UserId::from_string(&claims.sub)
            .map_err(|_| AuthError::UserNotFound(claims.sub.clone()))?;

        let Some(user) = self.repository.find_by_id(&user_id).await? else {
            return Err(AuthError::UserNotFound(user_id.to_string()));
        };

        Ok(Principal {
            user_id: user.id,
            email: user.email.as_str().to_string(),
            roles: user.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::auth::models::EmailAddress;

    mock! {
        pub TestAuthRepository {}

        #[async_trait]
        impl AuthRepository for TestAuthRepository {
            async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<AuthUser>, AuthError>;
            async fn save_user(&self, user: AuthUser) -> Result<(), AuthError>;
            async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;
            async fn find_refresh_token(
                &self,
                user_id: &UserId,
                token_id: &TokenId,
            ) -> Result<Option<RefreshTokenRecord>, AuthError>;
            async fn revoke_refresh_token(
                &self,
                user_id: &UserId,
                token_id: &TokenId,
            ) -> Result<(), AuthError>;
        }
    }

    const ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes!";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-bytes";

    fn service(repository: MockTestAuthRepository) -> AuthService<MockTestAuthRepository> {
        AuthService::new(
            Arc::new(repository),
            ACCESS_SECRET,
            REFRESH_SECRET,
            Duration::from_secs(15 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        )
    }

    fn user_with_password(password: &str) -> AuthUser {
        AuthUser {
            id: UserId::new(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            roles: vec![Role::Patient],
        }
    }

    fn register_command(roles: Vec<String>) -> RegisterCommand {
        RegisterCommand::new(
            EmailAddress::new("alice@example.com".to_string()).unwrap(),
            "secret1".to_string(),
            roles,
        )
    }

    /// Build a refresh token the way issue_tokens does, plus the matching
    /// persisted record.
    fn issued_refresh_token(user: &AuthUser, expires_at: DateTime<Utc>) -> (String, RefreshTokenRecord) {
        let token_id = TokenId::new();
        let claims = RefreshClaims {
            sub: user.id.to_string(),
            jti: token_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + chrono::Duration::days(7)).timestamp(),
        };
        let token = TokenCodec::new(REFRESH_SECRET).encode(&claims).unwrap();
        let record = RefreshTokenRecord {
            user_id: user.id,
            token_id,
            hashed_token: PasswordHasher::new().hash(&token).unwrap(),
            expires_at,
        };
        (token, record)
    }

    #[tokio::test]
    async fn test_register_defaults_to_baseline_role() {
        let mut repository = MockTestAuthRepository::new();

        repository
            .expect_find_by_email()
            .with(eq("alice@example.com"))
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_save_user()
            .withf(|user| {
                user.roles == vec![Role::Patient] && user.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|_| Ok(()));
        repository
            .expect_save_refresh_token()
            .withf(|record| record.hashed_token.starts_with("$argon2"))
            .times(1)
            .returning(|_| Ok(()));

        let pair = service(repository)
            .register(register_command(vec![]))
            .await
            .expect("register failed");

        let claims: AccessClaims = TokenCodec::new(ACCESS_SECRET)
            .decode(&pair.access_token)
            .expect("access token did not verify");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.roles, vec![Role::Patient]);
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestAuthRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(user_with_password("other"))));
        repository.expect_save_user().times(0);
        repository.expect_save_refresh_token().times(0);

        let result = service(repository).register(register_command(vec![])).await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_role_persists_nothing() {
        let mut repository = MockTestAuthRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_save_user().times(0);
        repository.expect_save_refresh_token().times(0);

        let result = service(repository)
            .register(register_command(vec![
                "superuser".to_string(),
                "admin".to_string(),
            ]))
            .await;

        match result {
            Err(AuthError::InvalidRole(names)) => {
                assert!(names.contains("superuser"));
                assert!(!names.contains("admin"));
            }
            other => panic!("expected InvalidRole, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_accepts_explicit_roles() {
        let mut repository = MockTestAuthRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_save_user()
            .withf(|user| user.roles == vec![Role::Clinician, Role::Student])
            .times(1)
            .returning(|_| Ok(()));
        repository
            .expect_save_refresh_token()
            .times(1)
            .returning(|_| Ok(()));

        let result = service(repository)
            .register(register_command(vec![
                "clinician".to_string(),
                " student ".to_string(),
            ]))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut repository = MockTestAuthRepository::new();

        repository
            .expect_find_by_email()
            .with(eq("alice@example.com"))
            .times(1)
            .returning(|_| Ok(Some(user_with_password("secret1"))));
        repository
            .expect_save_refresh_token()
            .times(1)
            .returning(|_| Ok(()));

        let pair = service(repository)
            .login(LoginCommand {
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .expect("login failed");

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_is_non_enumerable() {
        // Unknown email and wrong password must be indistinguishable.
        let mut absent = MockTestAuthRepository::new();
        absent.expect_find_by_email().times(1).returning(|_| Ok(None));

        let unknown_email = service(absent)
            .login(LoginCommand {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            })
            .await;

        let mut present = MockTestAuthRepository::new();
        present
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(user_with_password("right-password"))));

        let wrong_password = service(present)
            .login(LoginCommand {
                email: "alice@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;

        assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let user = user_with_password("secret1");
        let (token, record) = issued_refresh_token(&user, Utc::now() + chrono::Duration::days(7));

        let mut repository = MockTestAuthRepository::new();
        let returned_record = record.clone();
        repository
            .expect_find_refresh_token()
            .withf(move |uid, tid| *uid == record.user_id && *tid == record.token_id)
            .times(1)
            .returning(move |_, _| Ok(Some(returned_record.clone())));
        repository
            .expect_revoke_refresh_token()
            .times(1)
            .returning(|_, _| Ok(()));
        let returned_user = user.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));
        repository
            .expect_save_refresh_token()
            .times(1)
            .returning(|_| Ok(()));

        let pair = service(repository)
            .refresh(&token)
            .await
            .expect("refresh failed");

        assert_ne!(pair.refresh_token, token);
    }

    #[tokio::test]
    async fn test_refresh_unknown_record() {
        let user = user_with_password("secret1");
        let (token, _) = issued_refresh_token(&user, Utc::now() + chrono::Duration::days(7));

        let mut repository = MockTestAuthRepository::new();
        repository
            .expect_find_refresh_token()
            .times(1)
            .returning(|_, _| Ok(None));
        repository.expect_revoke_refresh_token().times(0);

        let result = service(repository).refresh(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_expired_record_is_revoked() {
        let user = user_with_password("secret1");
        let (token, record) = issued_refresh_token(&user, Utc::now() - chrono::Duration::hours(1));

        let mut repository = MockTestAuthRepository::new();
        repository
            .expect_find_refresh_token()
            .times(1)
            .returning(move |_, _| Ok(Some(record.clone())));
        repository
            .expect_revoke_refresh_token()
            .times(1)
            .returning(|_, _| Ok(()));
        repository.expect_find_by_id().times(0);
        repository.expect_save_refresh_token().times(0);

        let result = service(repository).refresh(&token).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));
    }

    #[tokio::test]
    async fn test_refresh_hash_mismatch() {
        let user = user_with_password("secret1");
        let (token, mut record) =
            issued_refresh_token(&user, Utc::now() + chrono::Duration::days(7));
        // Record hash was taken over a different bearer string.
        record.hashed_token = PasswordHasher::new().hash("some-other-token").unwrap();

        let mut repository = MockTestAuthRepository::new();
        repository
            .expect_find_refresh_token()
            .times(1)
            .returning(move |_, _| Ok(Some(record.clone())));
        repository.expect_revoke_refresh_token().times(0);
        repository.expect_save_refresh_token().times(0);

        let result = service(repository).refresh(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_garbage_token_never_touches_store() {
        let repository = MockTestAuthRepository::new();

        let result = service(repository).refresh("not.a.token").await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let user = user_with_password("secret1");
        let (token, record) = issued_refresh_token(&user, Utc::now() + chrono::Duration::days(7));

        let mut repository = MockTestAuthRepository::new();
        repository
            .expect_find_refresh_token()
            .times(1)
            .returning(move |_, _| Ok(Some(record.clone())));
        repository
            .expect_revoke_refresh_token()
            .times(1)
            .returning(|_, _| Ok(()));
        repository.expect_find_by_id().times(1).returning(|_| Ok(None));

        let result = service(repository).refresh(&token).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_access_returns_principal() {
        let user = user_with_password("secret1");
        let user_id = user.id;

        let mut repository = MockTestAuthRepository::new();
        let returned_user = user.clone();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.as_str().to_string(),
            roles: user.roles.clone(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 900,
        };

        let principal = service(repository)
            .validate_access(&claims)
            .await
            .expect("validate failed");

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.email, "alice@example.com");
        assert_eq!(principal.roles, vec![Role::Patient]);
    }

    #[tokio::test]
    async fn test_validate_access_for_deleted_user() {
        let mut repository = MockTestAuthRepository::new();
        repository.expect_find_by_id().times(1).returning(|_| Ok(None));

        let claims = AccessClaims {
            sub: UserId::new().to_string(),
            email: "ghost@example.com".to_string(),
            roles: vec![Role::Patient],
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 900,
        };

        let result = service(repository).validate_access(&claims).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }
}

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::models::AuthUser;
use crate::auth::models::EmailAddress;
use crate::auth::models::RefreshTokenRecord;
use crate::auth::models::Role;
use crate::auth::models::TokenId;
use crate::auth::models::UserId;
use crate::auth::ports::AuthRepository;

/// Durable credential store backed by Postgres.
///
/// All tables live under a configurable schema. The schema name is
/// validated against an identifier grammar at configuration time, which is
/// what makes interpolating it into SQL safe; everything else is bound.
pub struct PostgresAuthRepository {
    pool: PgPool,
    schema: String,
}

impl PostgresAuthRepository {
    /// Create a repository over an existing pool.
    ///
    /// `schema` must already have passed config validation.
    pub fn new(pool: PgPool, schema: String) -> Self {
        Self { pool, schema }
    }

    /// Create the schema and tables if they do not exist yet.
    ///
    /// Idempotent, run once at startup before traffic is accepted.
    pub async fn migrate(&self) -> Result<(), AuthError> {
        let statements = [
            format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {}.auth_users (
                    user_id UUID PRIMARY KEY,
                    email TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    roles TEXT[] NOT NULL
                )
                "#,
                self.schema
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS auth_users_email_key \
                 ON {}.auth_users (lower(email))",
                self.schema
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {}.auth_refresh_tokens (
                    user_id UUID NOT NULL,
                    token_id UUID NOT NULL,
                    hashed_token TEXT NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (user_id, token_id)
                )
                "#,
                self.schema
            ),
        ];

        for statement in statements {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        }

        Ok(())
    }

    fn user_from_row(row: &PgRow) -> Result<AuthUser, AuthError> {
        let id: Uuid = row
            .try_get("user_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let role_names: Vec<String> = row
            .try_get("roles")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        let roles = role_names
            .iter()
            .map(|name| name.parse::<Role>())
            .collect::<Result<Vec<Role>, _>>()
            .map_err(|e| AuthError::Internal(format!("Corrupt role in store: {e}")))?;

        Ok(AuthUser {
            id: UserId(id),
            email: EmailAddress::new(email)
                .map_err(|e| AuthError::Internal(format!("Corrupt email in store: {e}")))?,
            password_hash,
            roles,
        })
    }

    fn record_from_row(row: &PgRow) -> Result<RefreshTokenRecord, AuthError> {
        let user_id: Uuid = row
            .try_get("user_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let token_id: Uuid = row
            .try_get("token_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let hashed_token: String = row
            .try_get("hashed_token")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(RefreshTokenRecord {
            user_id: UserId(user_id),
            token_id: TokenId(token_id),
            hashed_token,
            expires_at,
        })
    }
}

#[async_trait]
impl AuthRepository for PostgresAuthRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let sql = format!(
            "SELECT user_id, email, password_hash, roles \
             FROM {}.auth_users \
             WHERE lower(email) = lower($1) \
             LIMIT 1",
            self.schema
        );

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<AuthUser>, AuthError> {
        let sql = format!(
            "SELECT user_id, email, password_hash, roles \
             FROM {}.auth_users \
             WHERE user_id = $1 \
             LIMIT 1",
            self.schema
        );

        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn save_user(&self, user: AuthUser) -> Result<(), AuthError> {
        let sql = format!(
            "INSERT INTO {}.auth_users (user_id, email, password_hash, roles) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE \
             SET email = excluded.email, \
                 password_hash = excluded.password_hash, \
                 roles = excluded.roles",
            self.schema
        );

        let role_names: Vec<String> = user
            .roles
            .iter()
            .map(|role| role.as_str().to_string())
            .collect();

        sqlx::query(&sql)
            .bind(user.id.0)
            .bind(user.email.as_str())
            .bind(user.password_hash.as_str())
            .bind(&role_names)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // Loser of a concurrent duplicate registration lands here.
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AuthError::DuplicateEmail(user.email.to_string());
                    }
                }
                AuthError::StoreUnavailable(e.to_string())
            })?;

        Ok(())
    }

    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let sql = format!(
            "INSERT INTO {}.auth_refresh_tokens (user_id, token_id, hashed_token, expires_at) \
             VALUES ($1, $2, $3, $4)",
            self.schema
        );

        sqlx::query(&sql)
            .bind(record.user_id.0)
            .bind(record.token_id.0)
            .bind(record.hashed_token.as_str())
            .bind(record.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn find_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let sql = format!(
            "SELECT user_id, token_id, hashed_token, expires_at \
             FROM {}.auth_refresh_tokens \
             WHERE user_id = $1 AND token_id = $2 \
             LIMIT 1",
            self.schema
        );

        let row = sqlx::query(&sql)
            .bind(user_id.0)
            .bind(token_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn revoke_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<(), AuthError> {
        let sql = format!(
            "DELETE FROM {}.auth_refresh_tokens \
             WHERE user_id = $1 AND token_id = $2",
            self.schema
        );

        // Zero rows affected is fine: revocation is idempotent.
        sqlx::query(&sql)
            .bind(user_id.0)
            .bind(token_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::auth::errors::AuthError;
use crate::auth::models::AuthUser;
use crate::auth::models::RefreshTokenRecord;
use crate::auth::models::TokenId;
use crate::auth::models::UserId;
use crate::auth::ports::AuthRepository;

#[derive(Default)]
struct Tables {
    users_by_id: HashMap<UserId, AuthUser>,
    id_by_email: HashMap<String, UserId>,
    refresh_tokens: HashMap<(UserId, TokenId), RefreshTokenRecord>,
}

/// Volatile credential store for tests and local runs without a database.
///
/// Indexed by id, by lowercased email, and by the composite refresh-token
/// key, so every lookup is a single map access. Locks are held only for the
/// duration of the map operation, never across an await point.
#[derive(Default)]
pub struct InMemoryAuthRepository {
    tables: RwLock<Tables>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> AuthError {
        AuthError::StoreUnavailable("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl AuthRepository for InMemoryAuthRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let tables = self.tables.read().map_err(|_| Self::lock_poisoned())?;
        Ok(tables
            .id_by_email
            .get(&email.to_lowercase())
            .and_then(|id| tables.users_by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<AuthUser>, AuthError> {
        let tables = self.tables.read().map_err(|_| Self::lock_poisoned())?;
        Ok(tables.users_by_id.get(id).cloned())
    }

    async fn save_user(&self, user: AuthUser) -> Result<(), AuthError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_poisoned())?;

        let email_key = user.email.normalized();
        if let Some(existing_id) = tables.id_by_email.get(&email_key) {
            if *existing_id != user.id {
                return Err(AuthError::DuplicateEmail(user.email.to_string()));
            }
        }

        // Upsert may change the email; drop the old index entry first.
        if let Some(previous) = tables.users_by_id.get(&user.id) {
            let previous_key = previous.email.normalized();
            if previous_key != email_key {
                tables.id_by_email.remove(&previous_key);
            }
        }

        tables.id_by_email.insert(email_key, user.id);
        tables.users_by_id.insert(user.id, user);
        Ok(())
    }

    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_poisoned())?;
        tables
            .refresh_tokens
            .insert((record.user_id, record.token_id), record);
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let tables = self.tables.read().map_err(|_| Self::lock_poisoned())?;
        Ok(tables.refresh_tokens.get(&(*user_id, *token_id)).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        user_id: &UserId,
        token_id: &TokenId,
    ) -> Result<(), AuthError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_poisoned())?;
        // Absent record is a no-op; revocation is idempotent.
        tables.refresh_tokens.remove(&(*user_id, *token_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::auth::models::EmailAddress;
    use crate::auth::models::Role;

    fn user(email: &str) -> AuthUser {
        AuthUser {
            id: UserId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: "$argon2id$test".to_string(),
            roles: vec![Role::Patient],
        }
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let repo = InMemoryAuthRepository::new();
        let alice = user("Alice@Example.com");
        repo.save_user(alice.clone()).await.unwrap();

        let found = repo.find_by_email("alice@example.COM").await.unwrap();
        assert_eq!(found.unwrap().id, alice.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryAuthRepository::new();
        repo.save_user(user("alice@example.com")).await.unwrap();

        let result = repo.save_user(user("ALICE@example.com")).await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_save_user_is_upsert() {
        let repo = InMemoryAuthRepository::new();
        let mut alice = user("alice@example.com");
        repo.save_user(alice.clone()).await.unwrap();

        alice.roles = vec![Role::Admin];
        repo.save_user(alice.clone()).await.unwrap();

        let found = repo.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(found.roles, vec![Role::Admin]);
    }

    #[tokio::test]
    async fn test_refresh_token_round_trip_and_idempotent_revoke() {
        let repo = InMemoryAuthRepository::new();
        let record = RefreshTokenRecord {
            user_id: UserId::new(),
            token_id: TokenId::new(),
            hashed_token: "$argon2id$test".to_string(),
            expires_at: Utc::now(),
        };
        repo.save_refresh_token(record.clone()).await.unwrap();

        let found = repo
            .find_refresh_token(&record.user_id, &record.token_id)
            .await
            .unwrap();
        assert!(found.is_some());

        repo.revoke_refresh_token(&record.user_id, &record.token_id)
            .await
            .unwrap();
        // Second revocation is a no-op, not an error.
        repo.revoke_refresh_token(&record.user_id, &record.token_id)
            .await
            .unwrap();

        let found = repo
            .find_refresh_token(&record.user_id, &record.token_id)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}

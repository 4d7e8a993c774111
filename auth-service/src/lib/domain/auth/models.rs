use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::errors::EmailError;
use crate::auth::errors::RoleError;
use crate::auth::errors::TokenIdError;
use crate::auth::errors::UserIdError;

/// Closed role enumeration.
///
/// The set is fixed at compile time; anything outside it is rejected at the
/// edge. Roles gate route access, they carry no other behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Clinician,
    Receptionist,
    Patient,
    Student,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Clinician,
        Role::Receptionist,
        Role::Patient,
        Role::Student,
    ];

    /// Role assigned when registration omits an explicit role list.
    pub const BASELINE: Role = Role::Patient;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Clinician => "clinician",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "clinician" => Ok(Role::Clinician),
            "receptionist" => Ok(Role::Receptionist),
            "patient" => Ok(Role::Patient),
            "student" => Ok(Role::Student),
            other => Err(RoleError::Unrecognized(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Refresh-token identifier, unique per issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub Uuid);

impl TokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, TokenIdError> {
        Uuid::parse_str(s)
            .map(TokenId)
            .map_err(|e| TokenIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser. Matching is
/// case-insensitive: stores index by the normalized (lowercased) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used as the uniqueness key.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity record owned by the credential store.
///
/// Invariants: email is unique (case-insensitive) at write time, and the
/// role set is never empty.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

/// Server-side session artifact backing one refresh token.
///
/// Holds a hash of the signed bearer secret, never the cleartext. Consumed
/// exactly once: on rotation, explicit revocation, or expiry detection.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub user_id: UserId,
    pub token_id: TokenId,
    pub hashed_token: String,
    pub expires_at: DateTime<Utc>,
}

/// The pair handed to the client on register, login, and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signed claims carried by a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

/// Signed claims carried by a long-lived refresh token.
///
/// `jti` keys the persisted record together with `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated identity materialized from verified access claims.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub roles: Vec<Role>,
}

/// Command to register a new account.
///
/// Role names stay raw strings here; the service validates them against the
/// closed enumeration so the error can name every offending value at once.
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: String,
    pub roles: Vec<String>,
}

impl RegisterCommand {
    pub fn new(email: EmailAddress, password: String, roles: Vec<String>) -> Self {
        Self {
            email,
            password,
            roles,
        }
    }
}

/// Command to authenticate with stored credentials.
///
/// The email stays a raw string: a malformed email must fail exactly like a
/// wrong password, so no validation happens before the lookup.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

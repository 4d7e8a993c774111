//! Credential primitives for the auth service
//!
//! Provides the low-level building blocks of credential issuance:
//! - Password hashing (Argon2id, per-call random salt)
//! - Signed bearer token encoding and decoding (HS256)
//! - The compact TTL grammar used by token configuration
//!
//! This crate knows nothing about users, roles, or storage. The service
//! crate composes these pieces into the register/login/refresh workflows.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth_core::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.compare("my_password", &digest).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth_core::TokenCodec;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Claims { sub: String, exp: i64 }
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let exp = chrono::Utc::now().timestamp() + 900;
//! let token = codec.encode(&Claims { sub: "user123".into(), exp }).unwrap();
//! let decoded: Claims = codec.decode(&token).unwrap();
//! assert_eq!(decoded.sub, "user123");
//! ```

pub mod password;
pub mod token;

pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::parse_ttl;
pub use token::TokenCodec;
pub use token::TokenError;

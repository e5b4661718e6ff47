//! Authentication utilities library
//!
//! Provides the credential primitives for the identity service:
//! - Password hashing (Argon2id)
//! - Scoped, expiring token issuance and verification (JWT)
//!
//! The service crate defines its own ports and orchestration; this crate is
//! pure computation with no I/O, so both primitives are safe to use from any
//! number of concurrent tasks.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! assert!(!hasher.verify("not_my_password", &digest));
//! ```
//!
//! ## Scoped Tokens
//! ```
//! use auth::{TokenCodec, TokenScope, TokenTtls};
//!
//! let codec = TokenCodec::hs256(b"secret_key_at_least_32_bytes_long!", TokenTtls::default());
//! let token = codec.issue("alice@example.com", TokenScope::Access).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! assert_eq!(claims.scope, TokenScope::Access);
//! ```

pub mod password;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenScope;
pub use token::TokenTtls;

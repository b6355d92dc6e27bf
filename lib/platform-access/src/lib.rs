//! Accounts and authentication for TimeTalker.
//!
//! This crate provides:
//! - The `User` account record
//! - Salted PBKDF2 password hashing (`hash_password`, `verify_password`)
//! - Stateless bearer tokens (`TokenIssuer`, `AuthenticatedUser`)
//!
//! Tokens are signed claims and are never stored server-side: a token is
//! valid exactly when its signature verifies and its expiry has not passed.
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use timetalker_core::UserId;
//! use timetalker_platform_access::{TokenIssuer, hash_password, verify_password};
//!
//! let hash = hash_password("pw123", 1_000);
//! assert!(verify_password("pw123", &hash));
//!
//! let issuer = TokenIssuer::new(b"secret", Duration::hours(24));
//! let user_id = UserId::new();
//! let issued = issuer.issue(user_id, "alice").expect("issue");
//! let user = issuer.verify(&issued.token).expect("verify");
//! assert_eq!(user.user_id(), user_id);
//! ```

pub mod error;
pub mod password;
pub mod token;
pub mod user;

pub use error::AuthenticationError;
pub use password::{DEFAULT_ITERATIONS, hash_password, verify_password};
pub use token::{AuthenticatedUser, Claims, IssuedToken, TokenIssuer};
pub use user::User;

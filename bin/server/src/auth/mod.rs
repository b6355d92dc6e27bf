//! Authentication for the TimeTalker server.
//!
//! This module provides:
//! - Account registration, login and profile management routes
//! - The user repository
//! - The [`RequireAuth`] bearer-token extractor
//!
//! Tokens are stateless: a token is accepted iff its signature verifies and
//! it has not expired. Deactivating an account does not revoke tokens
//! already issued; it only blocks new logins.

pub mod db;
pub mod middleware;
pub mod routes;

pub use middleware::{AuthRejection, RequireAuth};

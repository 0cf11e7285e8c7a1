//! Request middleware.

mod auth;

pub use auth::{auth_middleware, identity_middleware, require_admin, CurrentUser};

//! Endpoint groups, reachable through accessor methods on [`crate::Client`]

/// Session endpoints
pub mod auth;
/// Follow endpoints
pub mod follows;
/// Post endpoints
pub mod posts;
/// User endpoints
pub mod users;

pub use auth::Auth;
pub use follows::Follows;
pub use posts::Posts;
pub use users::Users;

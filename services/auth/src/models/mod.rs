//! Principal models

pub mod admin;
pub mod user;

// Re-export for convenience
pub use admin::Admin;
pub use user::User;

//! Entities module - domain records persisted in the database
//!
//! Each entity maps one table.

pub mod auth_code;
pub mod enums;
pub mod friend;
pub mod user;

// Re-exports for easier imports
pub use auth_code::AuthCode;
pub use enums::{AuthCodeKind, AuthCodeStatus, FriendRequestStatus, FriendStatus, Provider};
pub use friend::{Friend, FriendRequest};
pub use user::User;

//! Repositories module - one repository per table
//!
//! Queries are checked at run time (`sqlx::query` / `sqlx::query_as` with
//! `FromRow` entities), so the crate builds without a live database. Every
//! method returns `sqlx::Error` and lets the service turn it into an
//! `AppError` with `?`.
//!
//! Picking the fetch method:
//!   nothing back (INSERT/UPDATE/DELETE)  -> `.execute(..)`
//!   zero or one row                      -> `.fetch_optional(..)`
//!   exactly one row (RETURNING, COUNT)   -> `.fetch_one(..)`
//!   many rows                            -> `.fetch_all(..)`

pub mod auth_code;
pub mod friend;
pub mod friend_request;
pub mod traits;
pub mod user;

// Re-export the traits for easier imports
pub use traits::{Create, Delete, Read, Update};

// Re-export the repository structs
pub use auth_code::AuthCodeRepository;
pub use friend::FriendRepository;
pub use friend_request::{CreateFriendRequestDTO, FriendRequestRepository};
pub use user::UserRepository;

//! DTOs module - Data Transfer Objects
//!
//! DTOs separate the external representation (API bodies) from the internal
//! one (entities). Create/Update DTOs are the inputs of the repositories.

pub mod auth;
pub mod friend;
pub mod search;
pub mod user;

// Re-exports for easier imports
pub use auth::{
    CreateAuthCodeDTO, EmailCodeDTO, EmailDTO, GoogleAuthDTO, MessageDTO, PasswordResetDTO,
};
pub use friend::{FriendRead, FriendRequestRead, FriendUsernameDTO};
pub use search::{RetrieveDTO, SearchEnvelope};
pub use user::{
    CreateUserDTO, LoginDTO, SignupDTO, UpdateProfileDTO, UpdateUserDTO, UserRead,
    UserSearchQuery,
};

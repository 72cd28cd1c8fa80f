//! User DTOs - Data Transfer Objects for users

use crate::entities::{Provider, User};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").unwrap();
}

/// Public view of a user, returned by every endpoint that answers with a user.
/// Never carries the numeric id, the password hash or the refresh token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRead {
    pub uid: String,
    pub join_date: DateTime<Utc>,
    pub provider: Provider,
    pub profile_picture: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub disabled: bool,
    pub account_view: Option<String>,
    pub is_sidebar_open: Option<bool>,
}

impl From<User> for UserRead {
    fn from(value: User) -> Self {
        Self {
            uid: value.uid,
            join_date: value.join_date,
            provider: value.provider,
            profile_picture: value.profile_picture,
            email: value.email,
            username: value.username,
            fullname: value.fullname,
            disabled: value.disabled,
            account_view: value.account_view,
            is_sidebar_open: value.is_sidebar_open,
        }
    }
}

/// Body of `/auth/verify-email` and `/auth/signup`
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct SignupDTO {
    #[serde(default)]
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: Option<String>,

    #[serde(default)]
    pub confirm_password: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    #[validate(regex(path = *USERNAME_REGEX, message = "Username must be 3-32 letters, digits, '.', '_' or '-'"))]
    pub username: Option<String>,

    #[serde(default)]
    pub fullname: Option<String>,

    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginDTO {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `PATCH /user/profile/update`; only `Some` fields change
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateProfileDTO {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(regex(path = *USERNAME_REGEX, message = "Username must be 3-32 letters, digits, '.', '_' or '-'"))]
    pub username: Option<String>,

    #[serde(default)]
    pub fullname: Option<String>,

    #[serde(default)]
    pub profile_picture: Option<String>,

    #[serde(default)]
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: Option<String>,

    #[serde(default)]
    pub confirm_password: Option<String>,

    #[serde(default)]
    pub account_view: Option<String>,

    #[serde(default)]
    pub is_sidebar_open: Option<bool>,
}

/// DTO to create a new user (uid and join_date are generated by the repository)
#[derive(Debug, Clone)]
pub struct CreateUserDTO {
    pub provider: Provider,
    pub email: Option<String>,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub profile_picture: Option<String>,
    pub hashed_password: Option<String>,
    pub refresh_token: Option<String>,
}

/// DTO to update a user (only the modifiable columns)
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDTO {
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub profile_picture: Option<String>,
    pub account_view: Option<String>,
    pub is_sidebar_open: Option<bool>,
    pub hashed_password: Option<String>,
}

impl UpdateUserDTO {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.fullname.is_none()
            && self.profile_picture.is_none()
            && self.account_view.is_none()
            && self.is_sidebar_open.is_none()
            && self.hashed_password.is_none()
    }
}

/// Query parameters of `/user/search`
#[derive(Serialize, Deserialize, Debug)]
pub struct UserSearchQuery {
    pub search: String,
}

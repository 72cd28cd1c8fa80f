//! Auth DTOs - request bodies of the auth and account flows

use crate::entities::AuthCodeKind;
use serde::{Deserialize, Serialize};

/// Body of the Google endpoints; `state` is either `signup` or `login`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GoogleAuthDTO {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmailDTO {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmailCodeDTO {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PasswordResetDTO {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Plain `{"message": ...}` answer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub message: String,
}

impl MessageDTO {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// DTO to issue a new auth code (code and dates are generated by the repository)
#[derive(Debug, Clone)]
pub struct CreateAuthCodeDTO {
    pub email: String,
    pub request_type: AuthCodeKind,
}

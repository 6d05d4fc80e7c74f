use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::User;

/// Request body for user registration. Fields default to empty strings so
/// missing keys fall through to the handler's own validation message.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Envelope for register, login and session lookup responses.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Plain confirmation message, used by logout.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

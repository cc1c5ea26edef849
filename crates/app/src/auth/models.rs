//! Auth data models.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AccessToken, Password},
    uuids::TypedUuid,
};

/// User UUID
pub type UserUuid = TypedUuid<UserProfile>;

/// The authenticated identity, as published to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    #[serde(rename = "id")]
    pub uuid: UserUuid,

    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session returned by the auth API.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: AccessToken,
    pub refresh_token: Option<AccessToken>,
    pub expires_at: Option<Timestamp>,
}

/// Result of an account registration.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: AuthUser,

    /// Present when the backend signs new accounts in immediately.
    pub session: Option<AuthSession>,
}

/// Email and password pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Password,
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: Password,
    pub name: String,
    pub username: String,
}

/// Row in the `users` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "id")]
    pub uuid: UserUuid,
    pub email: String,
    pub name: String,
    pub username: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
}

/// Which notifications a user wants. Every kind is on until turned off, and
/// keys missing from a stored row keep that default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    /// Discounts and special offers.
    pub promotions: bool,

    /// Prize wheel winnings.
    pub rewards: bool,

    /// New designs in the catalog.
    pub catalog: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            promotions: true,
            rewards: true,
            catalog: true,
        }
    }
}

//! Account and credential payloads for `/auth/*`.

use serde::{Deserialize, Serialize};

/// The signed-in account as returned by login/register.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Login handle.
    #[serde(default)]
    pub username: String,
    /// Contact address.
    #[serde(default)]
    pub email: String,
    /// Whether the account may mutate the catalog.
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

/// `data` of a successful login/register: the user fields plus the bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// Account details.
    #[serde(flatten)]
    pub user: UserRecord,
    /// Bearer token.
    pub token: String,
}

/// Body for `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Body for `POST /auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired handle.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Body for `POST /auth/refresh`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The token being exchanged.
    pub token: String,
}

/// `data` of a successful refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
    /// Replacement bearer token.
    pub token: String,
}

use serde::{Deserialize, Serialize};

use super::enums::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// PBKDF2 password hash, never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

/// Client-role profile extension, keyed by the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client_id: i64,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub contact: Option<String>,
}

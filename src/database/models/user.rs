use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    /// bcrypt hash, never sent back to clients
    #[serde(skip_serializing)]
    pub password: String,
}

/// Account to create; `password_hash` must already be hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub username: String,
    pub password_hash: String,
}

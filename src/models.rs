//! Database row types
//!
//! Rows use plain i64 AUTOINCREMENT keys; timestamps are stored as RFC 3339
//! text, matching what SQLite keeps on disk.

use serde::Serialize;
use sqlx::FromRow;

/// Agent account. `password` holds a salted hash, never plaintext.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    pub created_at: String,
}

/// Client record, owner of zero or more meetings
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

/// Property listing, owned by exactly one user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Property {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub city: Option<String>,
    pub price: Option<i64>,
}

/// Meeting, owned by exactly one client
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Meeting {
    pub id: i64,
    pub client_id: i64,
    pub subject: String,
    pub location: Option<String>,
    pub scheduled_at: Option<String>,
}

/// One-to-one extension of a user, created at registration
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub website: Option<String>,
    /// Relative path under the uploads directory, if a picture was provided
    pub picture: Option<String>,
}

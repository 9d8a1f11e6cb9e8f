//! Login session persistence
//!
//! Sessions are plain rows keyed by a UUID token; the token travels in the
//! `session` cookie and is looked up per request. No in-process session state.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::User;

/// Create a session for a user and return its token
pub async fn create_session(pool: &SqlitePool, user_id: i64) -> AppResult<Uuid> {
    let token = Uuid::new_v4();

    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(token.to_string())
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a session token to its user, if the session exists
pub async fn find_user_by_token(pool: &SqlitePool, token: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.id, u.username, u.email, u.password, u.active, u.created_at \
         FROM sessions s JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Terminate a session (logout)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

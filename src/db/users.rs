//! User and property database operations
//!
//! Multi-row writes (formset apply, cascade delete, registration) run inside
//! explicit transactions so a failure leaves no partial state.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::forms::{FormData, RowAction};
use crate::models::{Property, User};

pub async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password, active, created_at) VALUES (?, ?, ?, 1, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, active, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list_users(pool: &SqlitePool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, active, created_at FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, active, created_at FROM users \
         WHERE username = ? ORDER BY id LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list_properties(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Property>> {
    let properties = sqlx::query_as::<_, Property>(
        "SELECT id, user_id, address, city, price FROM properties WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(properties)
}

/// Apply a validated property formset bundle for one user, all rows or none
///
/// Updates and deletes are scoped by `user_id` so a bundle can never touch
/// another user's rows.
pub async fn apply_property_rows(
    pool: &SqlitePool,
    user_id: i64,
    actions: &[RowAction],
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    for action in actions {
        match action {
            RowAction::Create(data) => {
                sqlx::query(
                    "INSERT INTO properties (user_id, address, city, price) VALUES (?, ?, ?, ?)",
                )
                .bind(user_id)
                .bind(data.text("address"))
                .bind(data.opt_text("city"))
                .bind(data.integer("price"))
                .execute(&mut *tx)
                .await?;
            }
            RowAction::Update { id, data } => {
                sqlx::query(
                    "UPDATE properties SET address = ?, city = ?, price = ? \
                     WHERE id = ? AND user_id = ?",
                )
                .bind(data.text("address"))
                .bind(data.opt_text("city"))
                .bind(data.integer("price"))
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
            RowAction::Delete { id } => {
                sqlx::query("DELETE FROM properties WHERE id = ? AND user_id = ?")
                    .bind(id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Delete a user and everything it owns in one unit of work
pub async fn delete_user(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_profiles WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM properties WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Create a user and its profile atomically (registration path)
///
/// Both inserts share one transaction; a failure on either leaves neither.
pub async fn register_user(
    pool: &SqlitePool,
    account: &FormData,
    password_hash: &str,
    website: Option<&str>,
    picture: Option<&str>,
) -> AppResult<i64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password, active, created_at) VALUES (?, ?, ?, 1, ?)",
    )
    .bind(account.text("username"))
    .bind(account.text("email"))
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    let user_id = result.last_insert_rowid();

    sqlx::query("INSERT INTO user_profiles (user_id, website, picture) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(website)
        .bind(picture)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}

//! Client and meeting database operations

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::forms::RowAction;
use crate::models::{Client, Meeting};

pub async fn insert_client(
    pool: &SqlitePool,
    name: &str,
    company: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO clients (name, company, email, phone, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(company)
    .bind(email)
    .bind(phone)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_client(pool: &SqlitePool, id: i64) -> AppResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        "SELECT id, name, company, email, phone, created_at FROM clients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(client)
}

pub async fn list_clients(pool: &SqlitePool) -> AppResult<Vec<Client>> {
    let clients = sqlx::query_as::<_, Client>(
        "SELECT id, name, company, email, phone, created_at FROM clients ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(clients)
}

pub async fn list_meetings(pool: &SqlitePool, client_id: i64) -> AppResult<Vec<Meeting>> {
    let meetings = sqlx::query_as::<_, Meeting>(
        "SELECT id, client_id, subject, location, scheduled_at FROM meetings \
         WHERE client_id = ? ORDER BY id",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;
    Ok(meetings)
}

/// Apply a validated meeting formset bundle for one client, all rows or none
pub async fn apply_meeting_rows(
    pool: &SqlitePool,
    client_id: i64,
    actions: &[RowAction],
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    for action in actions {
        match action {
            RowAction::Create(data) => {
                sqlx::query(
                    "INSERT INTO meetings (client_id, subject, location, scheduled_at) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(client_id)
                .bind(data.text("subject"))
                .bind(data.opt_text("location"))
                .bind(data.opt_text("scheduled_at"))
                .execute(&mut *tx)
                .await?;
            }
            RowAction::Update { id, data } => {
                sqlx::query(
                    "UPDATE meetings SET subject = ?, location = ?, scheduled_at = ? \
                     WHERE id = ? AND client_id = ?",
                )
                .bind(data.text("subject"))
                .bind(data.opt_text("location"))
                .bind(data.opt_text("scheduled_at"))
                .bind(id)
                .bind(client_id)
                .execute(&mut *tx)
                .await?;
            }
            RowAction::Delete { id } => {
                sqlx::query("DELETE FROM meetings WHERE id = ? AND client_id = ?")
                    .bind(id)
                    .bind(client_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Delete a client and its meetings in one unit of work
pub async fn delete_client(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM meetings WHERE client_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

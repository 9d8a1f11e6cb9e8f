//! User profile lookups
//!
//! Profiles are created only through `users::register_user`, which keeps the
//! account and profile inserts in one transaction.

use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::models::UserProfile;

pub async fn get_profile_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> AppResult<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, user_id, website, picture FROM user_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

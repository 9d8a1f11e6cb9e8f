//! Authentication: password hashing, credential checks, session cookies
//!
//! Passwords are stored as `salt$hash` where hash is SHA-256 over the salt
//! concatenated with the plaintext. The session token is a UUID carried in an
//! HttpOnly cookie and resolved against the sessions table per request; there
//! is no ambient auth state.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::{sessions, users};
use crate::error::AppResult;
use crate::models::User;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

const SALT_LEN: usize = 16;

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(plain: &str) -> String {
    use rand::Rng;

    let salt: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();

    format!("{}${}", salt, salted_digest(&salt, plain))
}

/// Check a plaintext password against a stored `salt$hash` value
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, plain) == digest,
        None => false,
    }
}

fn salted_digest(salt: &str, plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Result of a credential check
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials match an active account
    Valid(User),
    /// Credentials match but the account is deactivated
    Disabled,
    /// Unknown username or wrong password
    InvalidCredentials,
}

/// Verify a username/password pair against stored credentials
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> AppResult<AuthOutcome> {
    let Some(user) = users::find_by_username(pool, username).await? else {
        return Ok(AuthOutcome::InvalidCredentials);
    };

    if !verify_password(password, &user.password) {
        return Ok(AuthOutcome::InvalidCredentials);
    }

    if !user.active {
        return Ok(AuthOutcome::Disabled);
    }

    Ok(AuthOutcome::Valid(user))
}

/// The authenticated caller, inserted into request extensions by
/// `require_session` (and looked up ad hoc by handlers that gate on login)
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub user: User,
}

/// Extract the session token from the Cookie header, if any
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Set-Cookie value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token)
}

/// Set-Cookie value clearing the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the caller's session from request headers, if one exists
pub async fn current_session(
    pool: &SqlitePool,
    headers: &HeaderMap,
) -> AppResult<Option<CurrentSession>> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };

    match sessions::find_user_by_token(pool, &token).await? {
        Some(user) => Ok(Some(CurrentSession { token, user })),
        None => Ok(None),
    }
}

/// Middleware gating routes behind an established session
///
/// Without a valid session the caller is redirected to /login. With one, the
/// session is made available to the handler through request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match current_session(&state.db, request.headers()).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Session lookup failed: {}", e);
            None
        }
    };

    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => crate::api::found("/login"),
    }
}

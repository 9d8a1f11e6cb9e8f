//! Login and logout views
//!
//! Failed logins answer with plain text bodies (no redirect, no re-render);
//! a successful login sets the session cookie and redirects to the listing.

use axum::{
    extract::{Form, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Extension,
};
use std::collections::HashMap;

use crate::auth::{self, AuthOutcome, CurrentSession};
use crate::db::sessions;
use crate::error::AppResult;
use crate::render::page;
use crate::AppState;

/// GET /login
pub async fn form() -> Html<String> {
    let body = "<h1>Login</h1>\n\
                <form method=\"post\" action=\"/login\">\n\
                <label for=\"username\">Username</label>\n\
                <input type=\"text\" id=\"username\" name=\"username\">\n\
                <label for=\"password\">Password</label>\n\
                <input type=\"password\" id=\"password\" name=\"password\">\n\
                <button>Login</button>\n</form>";
    Html(page("Login", body))
}

/// POST /login
pub async fn submit(
    State(state): State<AppState>,
    Form(raw): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let username = raw.get("username").map(String::as_str).unwrap_or("");
    let password = raw.get("password").map(String::as_str).unwrap_or("");

    match auth::authenticate(&state.db, username, password).await? {
        AuthOutcome::Valid(user) => {
            let token = sessions::create_session(&state.db, user.id).await?;
            tracing::info!("User {} logged in", user.username);
            Ok((
                [(header::SET_COOKIE, auth::session_cookie(&token.to_string()))],
                super::found("/"),
            )
                .into_response())
        }
        AuthOutcome::Disabled => Ok("Your account is disabled.".into_response()),
        AuthOutcome::InvalidCredentials => {
            tracing::warn!("Invalid login details for username {:?}", username);
            Ok("Invalid login details supplied.".into_response())
        }
    }
}

/// GET /logout
///
/// Behind the session middleware; callers without a session never reach this
/// handler (they are redirected to /login).
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> AppResult<Response> {
    sessions::delete_session(&state.db, &session.token).await?;
    tracing::info!("User {} logged out", session.user.username);

    Ok((
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        super::found("/"),
    )
        .into_response())
}

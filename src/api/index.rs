//! Listing view: all users and all clients on one page

use axum::{extract::State, response::Html};

use crate::error::AppResult;
use crate::render::{escape, page};
use crate::{db, AppState};

/// GET /
///
/// Empty collections are valid output; there is no pagination or filtering.
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let users = db::users::list_users(&state.db).await?;
    let clients = db::clients::list_clients(&state.db).await?;

    let mut body = String::from("<h1>Listing</h1>\n<h2>Users</h2>\n");

    if users.is_empty() {
        body.push_str("<p>No users yet.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Username</th><th>Email</th><th>Active</th><th></th></tr>\n");
        for user in &users {
            body.push_str(&format!(
                "<tr><td><a href=\"/user/{id}\">{username}</a></td>\
                 <td>{email}</td><td>{active}</td>\
                 <td><form method=\"post\" action=\"/user/{id}/delete\">\
                 <input type=\"hidden\" name=\"confirm\" value=\"delete\">\
                 <button>Delete</button></form></td></tr>\n",
                id = user.id,
                username = escape(&user.username),
                email = escape(&user.email),
                active = if user.active { "yes" } else { "no" },
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str("<h2>Clients</h2>\n");

    if clients.is_empty() {
        body.push_str("<p>No clients yet.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Name</th><th>Company</th><th>Email</th><th></th></tr>\n");
        for client in &clients {
            body.push_str(&format!(
                "<tr><td><a href=\"/client/{id}\">{name}</a></td>\
                 <td>{company}</td><td>{email}</td>\
                 <td><form method=\"post\" action=\"/client/{id}/delete\">\
                 <input type=\"hidden\" name=\"confirm\" value=\"delete\">\
                 <button>Delete</button></form></td></tr>\n",
                id = client.id,
                name = escape(&client.name),
                company = escape(client.company.as_deref().unwrap_or("")),
                email = escape(client.email.as_deref().unwrap_or("")),
            ));
        }
        body.push_str("</table>\n");
    }

    Ok(Html(page("Listing", &body)))
}

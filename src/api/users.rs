//! User views: create, detail with property formset, delete

use axum::{
    extract::{Form, Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::forms::{FieldErrors, FieldKind, FieldSpec, FormSchema, FormsetSchema};
use crate::render::{self, escape, page, FormsetRowValues};
use crate::{db, AppState};

/// Account fields for /user/new
pub const USER_FORM: FormSchema = FormSchema {
    name: "user",
    fields: &[
        FieldSpec {
            name: "username",
            label: "Username",
            kind: FieldKind::Text { max_len: 150 },
            required: true,
        },
        FieldSpec {
            name: "email",
            label: "Email",
            kind: FieldKind::Email,
            required: true,
        },
        FieldSpec {
            name: "password",
            label: "Password",
            kind: FieldKind::Password { min_len: 8 },
            required: true,
        },
    ],
};

/// Property rows bundled on the user detail page
pub const PROPERTY_ROWS: FormsetSchema = FormsetSchema {
    prefix: "prop",
    row: FormSchema {
        name: "property",
        fields: &[
            FieldSpec {
                name: "address",
                label: "Address",
                kind: FieldKind::Text { max_len: 200 },
                required: true,
            },
            FieldSpec {
                name: "city",
                label: "City",
                kind: FieldKind::Text { max_len: 100 },
                required: false,
            },
            FieldSpec {
                name: "price",
                label: "Price",
                kind: FieldKind::Integer {
                    min: 0,
                    max: 1_000_000_000,
                },
                required: false,
            },
        ],
    },
};

fn create_page(raw: &HashMap<String, String>, errors: &FieldErrors) -> String {
    let body = format!(
        "<h1>New user</h1>\n<form method=\"post\" action=\"/user/new\">\n{}\
         <button>Create</button>\n</form>",
        render::form_rows(&USER_FORM, raw, errors)
    );
    page("New user", &body)
}

/// GET /user/new
pub async fn create_form() -> Html<String> {
    Html(create_page(&HashMap::new(), &FieldErrors::new()))
}

/// POST /user/new
///
/// Valid: hash the password, insert, redirect to the new detail page.
/// Invalid: re-render the form with errors and the caller's input, 200.
pub async fn create_submit(
    State(state): State<AppState>,
    Form(raw): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    match USER_FORM.validate(&raw) {
        Ok(data) => {
            let password_hash = auth::hash_password(data.text("password"));
            let id = db::users::insert_user(
                &state.db,
                data.text("username"),
                data.text("email"),
                &password_hash,
            )
            .await?;
            tracing::info!("Created user {} ({})", id, data.text("username"));
            Ok(super::found(&format!("/user/{}", id)))
        }
        Err(errors) => Ok(Html(create_page(&raw, &errors)).into_response()),
    }
}

fn detail_page(
    user: &crate::models::User,
    rows: &[FormsetRowValues],
    errors: &FieldErrors,
) -> String {
    let body = format!(
        "<h1>{username}</h1>\n\
         <p>Email: {email}<br>Active: {active}<br>Created: {created}</p>\n\
         <h2>Properties</h2>\n\
         <form method=\"post\" action=\"/user/{id}\">\n{table}\
         <button>Save properties</button>\n</form>",
        username = escape(&user.username),
        email = escape(&user.email),
        active = if user.active { "yes" } else { "no" },
        created = escape(&user.created_at),
        id = user.id,
        table = render::formset_table(&PROPERTY_ROWS, rows, errors),
    );
    page(&user.username, &body)
}

async fn stored_rows(state: &AppState, user_id: i64) -> AppResult<Vec<FormsetRowValues>> {
    let properties = db::users::list_properties(&state.db, user_id).await?;
    let mut rows: Vec<FormsetRowValues> = properties
        .iter()
        .map(|p| {
            let mut values = HashMap::new();
            values.insert("address".to_string(), p.address.clone());
            if let Some(city) = &p.city {
                values.insert("city".to_string(), city.clone());
            }
            if let Some(price) = p.price {
                values.insert("price".to_string(), price.to_string());
            }
            FormsetRowValues {
                id: Some(p.id),
                values,
            }
        })
        .collect();

    // One blank slot for adding a record
    rows.push(FormsetRowValues::default());
    Ok(rows)
}

/// GET /user/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let user = db::users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with id {}", id)))?;

    let rows = stored_rows(&state, id).await?;
    Ok(Html(detail_page(&user, &rows, &FieldErrors::new())))
}

/// POST /user/:id
///
/// Validates the whole property bundle as one unit; all rows are applied in
/// a single transaction or none are.
pub async fn detail_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(raw): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let user = db::users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with id {}", id)))?;

    match PROPERTY_ROWS.validate(&raw) {
        Ok(actions) => {
            db::users::apply_property_rows(&state.db, id, &actions).await?;
            Ok(super::found(&format!("/user/{}", id)))
        }
        Err(errors) => {
            let rows = render::formset_values_from_raw(&PROPERTY_ROWS, &raw);
            Ok(Html(detail_page(&user, &rows, &errors)).into_response())
        }
    }
}

/// POST /user/:id/delete
///
/// Deletion happens only for an authenticated caller submitting the
/// confirmation field; anything else is a silent no-op. Either way the
/// response is a redirect to the listing.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Form<HashMap<String, String>>>,
) -> AppResult<Response> {
    db::users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with id {}", id)))?;

    let raw = body.map(|Form(raw)| raw).unwrap_or_default();
    let confirmed = raw.get("confirm").map(String::as_str) == Some("delete");
    let session = auth::current_session(&state.db, &headers).await?;

    if confirmed {
        if let Some(session) = session {
            db::users::delete_user(&state.db, id).await?;
            tracing::info!("User {} deleted by {}", id, session.user.username);
        } else {
            tracing::warn!("Unauthenticated delete attempt for user {}", id);
        }
    }

    Ok(super::found("/"))
}

//! Client views: create, detail with meeting formset, delete

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

/// Fields for /client/new
pub const CLIENT_FORM: FormSchema = FormSchema {
    name: "client",
    fields: &[
        FieldSpec {
            name: "name",
            label: "Name",
            kind: FieldKind::Text { max_len: 150 },
            required: true,
        },
        FieldSpec {
            name: "company",
            label: "Company",
            kind: FieldKind::Text { max_len: 150 },
            required: false,
        },
        FieldSpec {
            name: "email",
            label: "Email",
            kind: FieldKind::Email,
            required: false,
        },
        FieldSpec {
            name: "phone",
            label: "Phone",
            kind: FieldKind::Text { max_len: 40 },
            required: false,
        },
    ],
};

/// Meeting rows bundled on the client detail page
pub const MEETING_ROWS: FormsetSchema = FormsetSchema {
    prefix: "mtg",
    row: FormSchema {
        name: "meeting",
        fields: &[
            FieldSpec {
                name: "subject",
                label: "Subject",
                kind: FieldKind::Text { max_len: 200 },
                required: true,
            },
            FieldSpec {
                name: "location",
                label: "Location",
                kind: FieldKind::Text { max_len: 200 },
                required: false,
            },
            FieldSpec {
                name: "scheduled_at",
                label: "Scheduled",
                kind: FieldKind::DateTime,
                required: false,
            },
        ],
    },
};

fn create_page(raw: &HashMap<String, String>, errors: &FieldErrors) -> String {
    let body = format!(
        "<h1>New client</h1>\n<form method=\"post\" action=\"/client/new\">\n{}\
         <button>Create</button>\n</form>",
        render::form_rows(&CLIENT_FORM, raw, errors)
    );
    page("New client", &body)
}

/// GET /client/new
pub async fn create_form() -> Html<String> {
    Html(create_page(&HashMap::new(), &FieldErrors::new()))
}

/// POST /client/new
pub async fn create_submit(
    State(state): State<AppState>,
    Form(raw): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    match CLIENT_FORM.validate(&raw) {
        Ok(data) => {
            let id = db::clients::insert_client(
                &state.db,
                data.text("name"),
                data.opt_text("company"),
                data.opt_text("email"),
                data.opt_text("phone"),
            )
            .await?;
            tracing::info!("Created client {} ({})", id, data.text("name"));
            Ok(super::found(&format!("/client/{}", id)))
        }
        Err(errors) => Ok(Html(create_page(&raw, &errors)).into_response()),
    }
}

fn detail_page(
    client: &crate::models::Client,
    rows: &[FormsetRowValues],
    errors: &FieldErrors,
) -> String {
    let body = format!(
        "<h1>{name}</h1>\n\
         <p>Company: {company}<br>Email: {email}<br>Phone: {phone}</p>\n\
         <h2>Meetings</h2>\n\
         <form method=\"post\" action=\"/client/{id}\">\n{table}\
         <button>Save meetings</button>\n</form>",
        name = escape(&client.name),
        company = escape(client.company.as_deref().unwrap_or("")),
        email = escape(client.email.as_deref().unwrap_or("")),
        phone = escape(client.phone.as_deref().unwrap_or("")),
        id = client.id,
        table = render::formset_table(&MEETING_ROWS, rows, errors),
    );
    page(&client.name, &body)
}

async fn stored_rows(state: &AppState, client_id: i64) -> AppResult<Vec<FormsetRowValues>> {
    let meetings = db::clients::list_meetings(&state.db, client_id).await?;
    let mut rows: Vec<FormsetRowValues> = meetings
        .iter()
        .map(|m| {
            let mut values = HashMap::new();
            values.insert("subject".to_string(), m.subject.clone());
            if let Some(location) = &m.location {
                values.insert("location".to_string(), location.clone());
            }
            if let Some(scheduled_at) = &m.scheduled_at {
                // Stored as "YYYY-MM-DD HH:MM"; datetime-local wants a T
                values.insert(
                    "scheduled_at".to_string(),
                    scheduled_at.replacen(' ', "T", 1),
                );
            }
            FormsetRowValues {
                id: Some(m.id),
                values,
            }
        })
        .collect();

    rows.push(FormsetRowValues::default());
    Ok(rows)
}

/// GET /client/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let client = db::clients::get_client(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No client with id {}", id)))?;

    let rows = stored_rows(&state, id).await?;
    Ok(Html(detail_page(&client, &rows, &FieldErrors::new())))
}

/// POST /client/:id
pub async fn detail_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(raw): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let client = db::clients::get_client(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No client with id {}", id)))?;

    match MEETING_ROWS.validate(&raw) {
        Ok(actions) => {
            db::clients::apply_meeting_rows(&state.db, id, &actions).await?;
            Ok(super::found(&format!("/client/{}", id)))
        }
        Err(errors) => {
            let rows = render::formset_values_from_raw(&MEETING_ROWS, &raw);
            Ok(Html(detail_page(&client, &rows, &errors)).into_response())
        }
    }
}

/// POST /client/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Form<HashMap<String, String>>>,
) -> AppResult<Response> {
    db::clients::get_client(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No client with id {}", id)))?;

    let raw = body.map(|Form(raw)| raw).unwrap_or_default();
    let confirmed = raw.get("confirm").map(String::as_str) == Some("delete");
    let session = auth::current_session(&state.db, &headers).await?;

    if confirmed {
        if let Some(session) = session {
            db::clients::delete_client(&state.db, id).await?;
            tracing::info!("Client {} deleted by {}", id, session.user.username);
        } else {
            tracing::warn!("Unauthenticated delete attempt for client {}", id);
        }
    }

    Ok(super::found("/"))
}

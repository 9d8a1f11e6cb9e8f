//! Registration view: account + profile forms validated as a pair
//!
//! The body is multipart so the profile can carry an optional picture upload.
//! Both forms must validate before anything is written; the account and
//! profile inserts then share one transaction. On success the same page
//! re-renders with a success indicator (no redirect).

use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::forms::{FieldErrors, FieldKind, FieldSpec, FormSchema};
use crate::render::{self, page};
use crate::{db, AppState};

/// Account half of the registration page (same shape as /user/new)
pub const ACCOUNT_FORM: FormSchema = FormSchema {
    name: "account",
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

/// Profile half; the picture is a file field handled outside the schema
pub const PROFILE_FORM: FormSchema = FormSchema {
    name: "profile",
    fields: &[FieldSpec {
        name: "website",
        label: "Website",
        kind: FieldKind::Text { max_len: 200 },
        required: false,
    }],
};

fn register_page(raw: &HashMap<String, String>, errors: &FieldErrors, registered: bool) -> String {
    let banner = if registered {
        "<p class=\"success\">Registration successful. You can now log in.</p>\n"
    } else {
        ""
    };

    let body = format!(
        "<h1>Register</h1>\n{banner}\
         <form method=\"post\" action=\"/register\" enctype=\"multipart/form-data\">\n\
         <fieldset><legend>Account</legend>\n{account}</fieldset>\n\
         <fieldset><legend>Profile</legend>\n{profile}\
         <label for=\"picture\">Picture</label>\n\
         <input type=\"file\" id=\"picture\" name=\"picture\">\n</fieldset>\n\
         <button>Register</button>\n</form>",
        banner = banner,
        account = render::form_rows(&ACCOUNT_FORM, raw, errors),
        profile = render::form_rows(&PROFILE_FORM, raw, errors),
    );
    page("Register", &body)
}

/// GET /register
pub async fn form() -> Html<String> {
    Html(register_page(&HashMap::new(), &FieldErrors::new(), false))
}

/// POST /register
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut raw = HashMap::new();
    let mut picture: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "picture" {
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            if let Some(filename) = filename {
                if !bytes.is_empty() {
                    picture = Some((filename, bytes.to_vec()));
                }
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed field {}: {}", name, e)))?;
            raw.insert(name, value);
        }
    }

    let account = ACCOUNT_FORM.validate(&raw);
    let profile = PROFILE_FORM.validate(&raw);

    let (account, profile) = match (account, profile) {
        (Ok(account), Ok(profile)) => (account, profile),
        (account, profile) => {
            // Surface both forms' errors together; nothing is persisted
            let mut errors = FieldErrors::new();
            if let Err(e) = account {
                errors.merge(e);
            }
            if let Err(e) = profile {
                errors.merge(e);
            }
            return Ok(Html(register_page(&raw, &errors, false)).into_response());
        }
    };

    // Picture hits disk only after both forms validate
    let picture_path = match picture {
        Some((filename, bytes)) => Some(save_picture(&state, &filename, &bytes)?),
        None => None,
    };

    let password_hash = auth::hash_password(account.text("password"));
    let result = db::users::register_user(
        &state.db,
        &account,
        &password_hash,
        profile.opt_text("website"),
        picture_path.as_deref(),
    )
    .await;

    let user_id = match result {
        Ok(id) => id,
        Err(e) => {
            // Keep disk consistent with the rolled-back transaction
            if let Some(path) = &picture_path {
                if let Err(rm) = std::fs::remove_file(state.uploads_dir.join(path)) {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", path, rm);
                }
            }
            return Err(e);
        }
    };

    tracing::info!("Registered user {} ({})", user_id, account.text("username"));
    Ok(Html(register_page(&HashMap::new(), &FieldErrors::new(), true)).into_response())
}

/// Store an upload under a fresh name, keeping only a sanitized extension.
/// Returns the path relative to the uploads directory.
fn save_picture(state: &AppState, filename: &str, bytes: &[u8]) -> AppResult<String> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()) && e.len() <= 8);

    let stored_name = match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    std::fs::create_dir_all(&state.uploads_dir)?;
    std::fs::write(state.uploads_dir.join(&stored_name), bytes)?;
    Ok(stored_name)
}

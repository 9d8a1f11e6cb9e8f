//! HTTP handlers, one module per view family

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub mod clients;
pub mod health;
pub mod index;
pub mod login;
pub mod register;
pub mod users;

/// Classic HTTP 302 redirect, used by every success path
pub fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

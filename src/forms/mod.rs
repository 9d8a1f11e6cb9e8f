//! Schema-driven form validation
//!
//! Each view declares an explicit schema (field name → kind + rule). Raw
//! submitted key-value data is checked against the schema and produces either
//! cleaned `FormData` or a `FieldErrors` set the view re-renders alongside the
//! caller's original input. No reflection, no framework magic.

use chrono::NaiveDateTime;
use std::collections::HashMap;

pub mod formset;

pub use formset::{FormsetSchema, RowAction, MAX_ROWS};

/// Validation rule for a single field
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text, bounded length
    Text { max_len: usize },
    /// Must contain a plausible address (local@domain with a dot)
    Email,
    /// Minimum length enforced; value is hashed before storage by the caller
    Password { min_len: usize },
    /// Whole number within an inclusive range
    Integer { min: i64, max: i64 },
    /// HTML `datetime-local` style value, normalized to "YYYY-MM-DD HH:MM"
    DateTime,
}

/// One declared form field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// A complete form: an ordered set of field specs
#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A single field-level validation failure
#[derive(Debug, Clone)]
pub struct FieldError {
    /// Submitted key the error belongs to (includes any formset row prefix)
    pub field: String,
    pub message: String,
}

/// Collected validation failures for a submission
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: FieldErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Messages attached to one submitted key
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }
}

/// Cleaned, validated values keyed by field name
///
/// Values are stored in their canonical text form (integers as decimal,
/// datetimes normalized); optional fields left blank are absent.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, String>,
}

impl FormData {
    /// Cleaned value, empty string if the field was blank or absent
    pub fn text(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Cleaned value for an optional field
    pub fn opt_text(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Cleaned integer value, if present
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(|v| v.parse().ok())
    }
}

impl FormSchema {
    /// Validate raw submitted data against this schema
    pub fn validate(&self, raw: &HashMap<String, String>) -> Result<FormData, FieldErrors> {
        self.validate_prefixed(raw, "")
    }

    /// Validate with a key prefix, used by formsets where row fields are
    /// submitted as `{prefix}{field}` (e.g. `prop-0-address`)
    pub(crate) fn validate_prefixed(
        &self,
        raw: &HashMap<String, String>,
        key_prefix: &str,
    ) -> Result<FormData, FieldErrors> {
        let mut data = FormData::default();
        let mut errors = FieldErrors::new();

        for spec in self.fields {
            let key = format!("{}{}", key_prefix, spec.name);
            let value = raw.get(&key).map(|v| v.trim()).unwrap_or("");

            if value.is_empty() {
                if spec.required {
                    errors.push(key, format!("{} is required.", spec.label));
                }
                continue;
            }

            match spec.kind {
                FieldKind::Text { max_len } => {
                    if value.chars().count() > max_len {
                        errors.push(key, format!("{} must be at most {} characters.", spec.label, max_len));
                    } else {
                        data.values.insert(spec.name.to_string(), value.to_string());
                    }
                }
                FieldKind::Email => {
                    if is_plausible_email(value) {
                        data.values.insert(spec.name.to_string(), value.to_string());
                    } else {
                        errors.push(key, format!("{} must be a valid email address.", spec.label));
                    }
                }
                FieldKind::Password { min_len } => {
                    if value.chars().count() < min_len {
                        errors.push(key, format!("{} must be at least {} characters.", spec.label, min_len));
                    } else {
                        data.values.insert(spec.name.to_string(), value.to_string());
                    }
                }
                FieldKind::Integer { min, max } => match value.parse::<i64>() {
                    Ok(n) if (min..=max).contains(&n) => {
                        data.values.insert(spec.name.to_string(), n.to_string());
                    }
                    Ok(_) => {
                        errors.push(key, format!("{} must be between {} and {}.", spec.label, min, max));
                    }
                    Err(_) => {
                        errors.push(key, format!("{} must be a whole number.", spec.label));
                    }
                },
                FieldKind::DateTime => match parse_datetime(value) {
                    Some(normalized) => {
                        data.values.insert(spec.name.to_string(), normalized);
                    }
                    None => {
                        errors.push(key, format!("{} must be a valid date and time.", spec.label));
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }

    /// True when every declared field is blank or absent in the submission
    pub(crate) fn all_blank(&self, raw: &HashMap<String, String>, key_prefix: &str) -> bool {
        self.fields.iter().all(|spec| {
            let key = format!("{}{}", key_prefix, spec.name);
            raw.get(&key).map(|v| v.trim().is_empty()).unwrap_or(true)
        })
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Accepts HTML datetime-local ("2026-03-01T14:30") or space-separated form;
/// normalizes to "YYYY-MM-DD HH:MM"
fn parse_datetime(value: &str) -> Option<String> {
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.format("%Y-%m-%d %H:%M").to_string());
        }
    }
    None
}

//! Formset validation: an ordered bundle of nested-record rows
//!
//! Row fields are submitted with indexed keys (`prop-0-address`,
//! `prop-1-address`, ...) plus a `{prefix}-total` management field giving the
//! row count. Each row may carry a `{prefix}-{i}-id` key (an existing record
//! being edited) and a `{prefix}-{i}-delete` checkbox. The whole bundle
//! validates as one unit: any row error fails the submission and nothing is
//! written.

use std::collections::HashMap;

use super::{FieldErrors, FormData, FormSchema};

/// Upper bound on rows per submission, to keep bundles sane
pub const MAX_ROWS: usize = 100;

/// Intent for one formset row after validation
#[derive(Debug, Clone)]
pub enum RowAction {
    /// Insert a new nested record
    Create(FormData),
    /// Update an existing nested record
    Update { id: i64, data: FormData },
    /// Remove an existing nested record
    Delete { id: i64 },
}

/// Schema for a bundle of nested-record rows
#[derive(Debug, Clone, Copy)]
pub struct FormsetSchema {
    /// Key prefix, e.g. "prop" for `prop-0-address`
    pub prefix: &'static str,
    /// Per-row field schema
    pub row: FormSchema,
}

impl FormsetSchema {
    /// Name of the management field carrying the row count
    pub fn total_key(&self) -> String {
        format!("{}-total", self.prefix)
    }

    /// Validate the whole bundle as a unit
    ///
    /// Blank rows without an id are skipped (the rendered form always carries
    /// one empty slot for adding a record). A delete mark on a row without an
    /// id is likewise a no-op.
    pub fn validate(&self, raw: &HashMap<String, String>) -> Result<Vec<RowAction>, FieldErrors> {
        let total_key = self.total_key();
        let total = match raw.get(&total_key).and_then(|v| v.parse::<usize>().ok()) {
            Some(n) if n <= MAX_ROWS => n,
            Some(_) => {
                let mut errors = FieldErrors::new();
                errors.push(total_key, format!("At most {} rows are allowed.", MAX_ROWS));
                return Err(errors);
            }
            None => {
                let mut errors = FieldErrors::new();
                errors.push(total_key, "Row count field is missing or invalid.");
                return Err(errors);
            }
        };

        let mut actions = Vec::new();
        let mut errors = FieldErrors::new();

        for i in 0..total {
            let key_prefix = format!("{}-{}-", self.prefix, i);

            let id = raw
                .get(&format!("{}id", key_prefix))
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().parse::<i64>());
            let id = match id {
                Some(Ok(id)) => Some(id),
                Some(Err(_)) => {
                    errors.push(format!("{}id", key_prefix), "Invalid record id.");
                    continue;
                }
                None => None,
            };

            let marked_delete = raw
                .get(&format!("{}delete", key_prefix))
                .map(|v| matches!(v.trim(), "on" | "1" | "true"))
                .unwrap_or(false);

            if marked_delete {
                if let Some(id) = id {
                    actions.push(RowAction::Delete { id });
                }
                continue;
            }

            // The blank add-a-record slot comes back empty; skip it
            if id.is_none() && self.row.all_blank(raw, &key_prefix) {
                continue;
            }

            match self.row.validate_prefixed(raw, &key_prefix) {
                Ok(data) => match id {
                    Some(id) => actions.push(RowAction::Update { id, data }),
                    None => actions.push(RowAction::Create(data)),
                },
                Err(row_errors) => errors.merge(row_errors),
            }
        }

        if errors.is_empty() {
            Ok(actions)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{FieldKind, FieldSpec};

    const ROWS: FormsetSchema = FormsetSchema {
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

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mixed_bundle_produces_all_three_intents() {
        let actions = ROWS
            .validate(&raw(&[
                ("prop-total", "3"),
                ("prop-0-id", "7"),
                ("prop-0-address", "1 Main St"),
                ("prop-1-id", "8"),
                ("prop-1-address", "ignored"),
                ("prop-1-delete", "on"),
                ("prop-2-address", "2 Oak Ave"),
                ("prop-2-price", "250000"),
            ]))
            .expect("bundle should validate");

        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], RowAction::Update { id: 7, .. }));
        assert!(matches!(actions[1], RowAction::Delete { id: 8 }));
        assert!(matches!(actions[2], RowAction::Create(_)));
    }

    #[test]
    fn blank_extra_slot_is_skipped() {
        let actions = ROWS
            .validate(&raw(&[
                ("prop-total", "2"),
                ("prop-0-id", "7"),
                ("prop-0-address", "1 Main St"),
                ("prop-1-address", ""),
            ]))
            .unwrap();
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn one_bad_row_fails_the_whole_bundle() {
        let errors = ROWS
            .validate(&raw(&[
                ("prop-total", "2"),
                ("prop-0-id", "7"),
                ("prop-0-address", "1 Main St"),
                ("prop-1-address", "2 Oak Ave"),
                ("prop-1-price", "not-a-number"),
            ]))
            .unwrap_err();
        assert_eq!(errors.for_field("prop-1-price").len(), 1);
    }

    #[test]
    fn missing_management_field_is_an_error() {
        let errors = ROWS.validate(&raw(&[("prop-0-address", "x")])).unwrap_err();
        assert!(!errors.for_field("prop-total").is_empty());
    }

    #[test]
    fn delete_without_id_is_noop() {
        let actions = ROWS
            .validate(&raw(&[
                ("prop-total", "1"),
                ("prop-0-address", "1 Main St"),
                ("prop-0-delete", "on"),
            ]))
            .unwrap();
        assert!(actions.is_empty());
    }
}

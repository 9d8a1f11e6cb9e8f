//! Server-rendered HTML
//!
//! Pages are assembled with `format!` and returned as `axum::response::Html`.
//! Re-rendered forms echo the caller's submitted values next to their field
//! errors, so a failed submission can be corrected in place. Password inputs
//! are the one exception: their values are never echoed back.

use axum::http::StatusCode;
use std::collections::HashMap;

use crate::forms::{FieldErrors, FieldKind, FieldSpec, FormSchema, FormsetSchema, MAX_ROWS};

/// Escape text for inclusion in HTML content or attribute values
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page shell shared by every view
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - agentdesk</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
            margin: 0;
        }}
        header {{
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 15px 20px;
        }}
        header a {{
            color: #4a9eff;
            text-decoration: none;
            margin-right: 15px;
        }}
        h1, h2 {{ color: #4a9eff; }}
        main {{ padding: 20px; max-width: 900px; }}
        label {{ display: block; margin-top: 10px; }}
        input[type=text], input[type=email], input[type=password],
        input[type=number], input[type=datetime-local] {{
            background: #2a2a2a;
            border: 1px solid #3a3a3a;
            color: #e0e0e0;
            padding: 6px;
            width: 300px;
        }}
        button {{
            margin-top: 12px;
            padding: 8px 18px;
            background: #4a9eff;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }}
        table {{ border-collapse: collapse; margin-top: 10px; }}
        th, td {{ border: 1px solid #3a3a3a; padding: 6px 10px; text-align: left; }}
        ul.errors {{ color: #ef4444; margin: 4px 0; }}
        .success {{ color: #10b981; }}
        fieldset {{ border: 1px solid #3a3a3a; margin-top: 15px; }}
    </style>
</head>
<body>
    <header>
        <a href="/">Home</a>
        <a href="/user/new">New user</a>
        <a href="/client/new">New client</a>
        <a href="/register">Register</a>
        <a href="/login">Login</a>
        <a href="/logout">Logout</a>
    </header>
    <main>
{body}
    </main>
</body>
</html>"#,
        title = escape(title),
        body = body
    )
}

/// Standalone error page (404 and friends)
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to listing</a></p>",
        status.as_u16(),
        escape(message)
    );
    page(&status.to_string(), &body)
}

fn input_type(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text { .. } => "text",
        FieldKind::Email => "email",
        FieldKind::Password { .. } => "password",
        FieldKind::Integer { .. } => "number",
        FieldKind::DateTime => "datetime-local",
    }
}

/// One labeled input with its error messages, keyed by the submitted name
pub fn field_row(spec: &FieldSpec, key: &str, value: &str, errors: &FieldErrors) -> String {
    let echoed = match spec.kind {
        FieldKind::Password { .. } => "",
        _ => value,
    };

    let mut row = format!(
        "<label for=\"{key}\">{label}</label>\n\
         <input type=\"{ty}\" id=\"{key}\" name=\"{key}\" value=\"{value}\">\n",
        key = escape(key),
        label = escape(spec.label),
        ty = input_type(&spec.kind),
        value = escape(echoed),
    );

    let messages = errors.for_field(key);
    if !messages.is_empty() {
        row.push_str("<ul class=\"errors\">\n");
        for message in messages {
            row.push_str(&format!("<li>{}</li>\n", escape(message)));
        }
        row.push_str("</ul>\n");
    }

    row
}

/// All rows of a plain (non-formset) form, echoing raw submitted values
pub fn form_rows(
    schema: &FormSchema,
    raw: &HashMap<String, String>,
    errors: &FieldErrors,
) -> String {
    schema
        .fields
        .iter()
        .map(|spec| {
            let value = raw.get(spec.name).map(String::as_str).unwrap_or("");
            field_row(spec, spec.name, value, errors)
        })
        .collect()
}

/// Values backing one rendered formset row
#[derive(Debug, Clone, Default)]
pub struct FormsetRowValues {
    /// Existing record id, None for the blank add-a-record slot
    pub id: Option<i64>,
    /// Field name → displayed value
    pub values: HashMap<String, String>,
}

/// Rebuild row values from a failed submission so edits are not lost,
/// ending with the blank add-a-record slot the stored view always has.
/// The caller-supplied row count is clamped to the validation limit so an
/// inflated total cannot drive an unbounded render.
pub fn formset_values_from_raw(
    schema: &FormsetSchema,
    raw: &HashMap<String, String>,
) -> Vec<FormsetRowValues> {
    let total = raw
        .get(&schema.total_key())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_ROWS);

    let mut rows: Vec<FormsetRowValues> = (0..total)
        .map(|i| {
            let key_prefix = format!("{}-{}-", schema.prefix, i);
            let id = raw
                .get(&format!("{}id", key_prefix))
                .and_then(|v| v.trim().parse::<i64>().ok());
            let values = schema
                .row
                .fields
                .iter()
                .filter_map(|spec| {
                    raw.get(&format!("{}{}", key_prefix, spec.name))
                        .map(|v| (spec.name.to_string(), v.clone()))
                })
                .collect();
            FormsetRowValues { id, values }
        })
        .collect();

    rows.push(FormsetRowValues::default());
    rows
}

/// Render a formset as an editable table: one row per record, a delete
/// checkbox on existing rows, and the hidden management/id fields
pub fn formset_table(
    schema: &FormsetSchema,
    rows: &[FormsetRowValues],
    errors: &FieldErrors,
) -> String {
    let mut html = format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        escape(&schema.total_key()),
        rows.len()
    );

    // Bundle-level errors (bad or oversized row count) have no cell to live in
    let messages = errors.for_field(&schema.total_key());
    if !messages.is_empty() {
        html.push_str("<ul class=\"errors\">");
        for message in messages {
            html.push_str(&format!("<li>{}</li>", escape(message)));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<table>\n<tr>");

    for spec in schema.row.fields {
        html.push_str(&format!("<th>{}</th>", escape(spec.label)));
    }
    html.push_str("<th>Delete</th></tr>\n");

    for (i, row) in rows.iter().enumerate() {
        let key_prefix = format!("{}-{}-", schema.prefix, i);
        html.push_str("<tr>");

        for spec in schema.row.fields {
            let key = format!("{}{}", key_prefix, spec.name);
            let value = row.values.get(spec.name).map(String::as_str).unwrap_or("");
            let mut cell = format!(
                "<input type=\"{ty}\" name=\"{key}\" value=\"{value}\">",
                ty = input_type(&spec.kind),
                key = escape(&key),
                value = escape(value),
            );
            let messages = errors.for_field(&key);
            if !messages.is_empty() {
                cell.push_str("<ul class=\"errors\">");
                for message in messages {
                    cell.push_str(&format!("<li>{}</li>", escape(message)));
                }
                cell.push_str("</ul>");
            }
            html.push_str(&format!("<td>{}</td>", cell));
        }

        match row.id {
            Some(id) => html.push_str(&format!(
                "<td><input type=\"hidden\" name=\"{prefix}id\" value=\"{id}\">\
                 <input type=\"checkbox\" name=\"{prefix}delete\"></td>",
                prefix = escape(&key_prefix),
                id = id,
            )),
            None => html.push_str("<td></td>"),
        }

        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: FormsetSchema = FormsetSchema {
        prefix: "prop",
        row: FormSchema {
            name: "property",
            fields: &[FieldSpec {
                name: "address",
                label: "Address",
                kind: FieldKind::Text { max_len: 200 },
                required: true,
            }],
        },
    };

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn inflated_row_count_is_clamped_on_re_render() {
        let rows = formset_values_from_raw(&ROWS, &raw(&[("prop-total", "5000000")]));
        // Clamped rows plus the blank add-a-record slot
        assert_eq!(rows.len(), MAX_ROWS + 1);
    }

    #[test]
    fn re_render_keeps_submitted_values_and_blank_slot() {
        let rows = formset_values_from_raw(
            &ROWS,
            &raw(&[
                ("prop-total", "1"),
                ("prop-0-id", "7"),
                ("prop-0-address", "1 Main St"),
            ]),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, Some(7));
        assert_eq!(rows[0].values.get("address").map(String::as_str), Some("1 Main St"));
        assert_eq!(rows[1].id, None);
        assert!(rows[1].values.is_empty());
    }

    #[test]
    fn bundle_level_errors_rendered_above_table() {
        let mut errors = FieldErrors::new();
        errors.push("prop-total", "At most 100 rows are allowed.");
        let html = formset_table(&ROWS, &[], &errors);
        assert!(html.contains("At most 100 rows are allowed."));
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<b a="x">&'</b>"#),
            "&lt;b a=&quot;x&quot;&gt;&amp;&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn password_value_not_echoed() {
        let spec = FieldSpec {
            name: "password",
            label: "Password",
            kind: FieldKind::Password { min_len: 8 },
            required: true,
        };
        let html = field_row(&spec, "password", "hunter2secret", &FieldErrors::new());
        assert!(!html.contains("hunter2secret"));
        assert!(html.contains("type=\"password\""));
    }

    #[test]
    fn field_errors_rendered_beside_input() {
        let spec = FieldSpec {
            name: "email",
            label: "Email",
            kind: FieldKind::Email,
            required: true,
        };
        let mut errors = FieldErrors::new();
        errors.push("email", "Email must be a valid email address.");
        let html = field_row(&spec, "email", "bogus", &errors);
        assert!(html.contains("value=\"bogus\""));
        assert!(html.contains("Email must be a valid email address."));
    }
}

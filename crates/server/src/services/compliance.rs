//! Checks a notice must pass before it is issued. Every violation is
//! collected into a single 422.

use std::collections::HashMap;

use serde_json::Value;
use shared_types::{AppError, NoticeTemplate, READ_ONLY_STATUSES};

/// Accumulated compliance failures keyed by the offending field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Violations {
    entries: Vec<(String, String)>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.push((field.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.entries.iter().any(|(f, _)| f == field)
    }

    /// `Ok(())` when clean, otherwise a 422 listing every violation.
    /// Multiple messages for one field are joined with `; `.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let count = self.entries.len();
        let mut field_errors: HashMap<String, String> = HashMap::new();
        for (field, message) in self.entries {
            field_errors
                .entry(field)
                .and_modify(|existing| {
                    existing.push_str("; ");
                    existing.push_str(&message);
                })
                .or_insert(message);
        }
        Err(AppError::validation(
            format!("Notice failed {} compliance check(s)", count),
            field_errors,
        ))
    }
}

/// Resolve a dotted path such as `case.borrower_name` in a JSON context.
pub fn lookup_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|seg| !seg.is_empty())
        .try_fold(context, |current, seg| current.get(seg))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Facts about the surroundings of a render that the template alone
/// cannot tell us.
#[derive(Debug, Clone, Default)]
pub struct RenderSubject {
    /// Status of the case being rendered for, absent for sample previews.
    pub case_status: Option<String>,
    pub language_active: bool,
}

/// Checks that can run before rendering.
pub fn check_before_render(
    template: &NoticeTemplate,
    context: &Value,
    subject: &RenderSubject,
    violations: &mut Violations,
) {
    for path in &template.required_fields {
        let missing = lookup_path(context, path).map_or(true, is_empty_value);
        if missing {
            violations.push(path.clone(), format!("required field {} is missing or empty", path));
        }
    }

    if let Some(status) = subject.case_status.as_deref() {
        if READ_ONLY_STATUSES.contains(&status) {
            violations.push("case", format!("notices cannot be issued on a {} case", status));
        }
    }

    if !template.is_active {
        violations.push("template", format!("template {} is inactive", template.code));
    }

    if !subject.language_active {
        violations.push(
            "language_code",
            format!("language {} is not active", template.language_code),
        );
    }
}

/// Checks on the rendered body.
pub fn check_after_render(content: &str, max_body_chars: usize, violations: &mut Violations) {
    let chars = content.chars().count();
    if chars > max_body_chars {
        violations.push(
            "body",
            format!(
                "rendered body is {} characters, limit is {}",
                chars, max_body_chars
            ),
        );
    }

    if crate::services::template::has_leftover_markers(content) {
        violations.push("body", "rendered body still contains template markers");
    }
}

//! Tera rendering shared by notice and SMS templates.

use serde_json::Value;
use tera::{Context, Tera};

/// Template names; Tera autoescapes names ending in `.html`.
const HTML_NAME: &str = "template.html";
const TEXT_NAME: &str = "template.txt";

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template source does not parse.
    Syntax(String),
    /// The template parsed but could not be rendered against the context
    /// (undefined variable, bad filter argument, ...).
    Render(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Syntax(m) => write!(f, "template syntax error: {}", m),
            TemplateError::Render(m) => write!(f, "template render error: {}", m),
        }
    }
}

/// Flatten a Tera error and its sources into one line.
fn describe(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}

/// Check that a template body parses.
pub fn check_syntax(body: &str) -> Result<(), TemplateError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEXT_NAME, body)
        .map_err(|e| TemplateError::Syntax(describe(&e)))
}

/// Render `body` against a JSON object context.
pub fn render(body: &str, context: &Value, autoescape: bool) -> Result<String, TemplateError> {
    let name = if autoescape { HTML_NAME } else { TEXT_NAME };
    let mut tera = Tera::default();
    tera.add_raw_template(name, body)
        .map_err(|e| TemplateError::Syntax(describe(&e)))?;

    let ctx = Context::from_value(context.clone())
        .map_err(|e| TemplateError::Render(describe(&e)))?;

    tera.render(name, &ctx)
        .map_err(|e| TemplateError::Render(describe(&e)))
}

/// Whether rendered output still contains template delimiters.
pub fn has_leftover_markers(rendered: &str) -> bool {
    ["{{", "}}", "{%", "%}"].iter().any(|m| rendered.contains(m))
}

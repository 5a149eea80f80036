//! Borrower SMS: template selection, rendering and delivery.

use serde_json::Value;
use shared_types::{AppError, Communication, LegalCase, SmsTemplate, DEFAULT_LANGUAGE};
use sqlx::{Pool, Postgres};

use crate::actor::Actor;
use crate::db::AppState;
use crate::repo::communication::NewCommunication;
use crate::services::masking::mask_mobile;
use crate::services::template::{self, TemplateError};
use crate::sms::SmsGateway;

/// Languages to try for a template, most specific first.
pub fn language_candidates(case_language: &str) -> Vec<&str> {
    if case_language == DEFAULT_LANGUAGE {
        vec![case_language]
    } else {
        vec![case_language, DEFAULT_LANGUAGE]
    }
}

/// Find the active variant of `code` for a case language. Falls back to
/// the default language, then to any active variant.
pub async fn resolve_template(
    pool: &Pool<Postgres>,
    code: &str,
    case_language: &str,
) -> Result<SmsTemplate, AppError> {
    for language in language_candidates(case_language) {
        if let Some(t) = crate::repo::sms_template::find_active_variant(pool, code, language).await? {
            return Ok(t);
        }
    }
    crate::repo::sms_template::find_any_active(pool, code)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No active SMS template {}", code)))
}

/// Render an SMS body and enforce the length limit.
pub fn render_sms(body: &str, context: &Value, max_chars: usize) -> Result<String, AppError> {
    let content = match template::render(body, context, false) {
        Ok(out) => out.trim().to_string(),
        Err(TemplateError::Syntax(msg)) => {
            return Err(AppError::bad_request(format!("Template syntax error: {}", msg)))
        }
        Err(TemplateError::Render(msg)) => return Err(AppError::field("template", msg)),
    };

    let chars = content.chars().count();
    if chars > max_chars {
        return Err(AppError::field(
            "content",
            format!("SMS is {} characters, limit is {}", chars, max_chars),
        ));
    }
    Ok(content)
}

/// Render and send an SMS to the case borrower, then record it.
///
/// Gateway failures are recorded with status `failed` and returned as a
/// normal result; only lookup, render and database errors are `Err`.
pub async fn send_sms(
    state: &AppState,
    case: &LegalCase,
    template_code: &str,
    extra: Option<Value>,
    actor: &Actor,
) -> Result<Communication, AppError> {
    let pool = &state.pool;
    let template = resolve_template(pool, template_code, &case.language_code).await?;

    let extra = crate::services::notice::extra_object(extra)?;
    let context = crate::services::notice::gather_context(pool, case, extra).await?;
    let max_chars = crate::config::notice_settings().sms_max_chars;
    let content = render_sms(&template.body, &context, max_chars)?;

    let (status, provider_reference, error_message) = match state
        .sms
        .send(&case.borrower_mobile, &content, template.dlt_template_id.as_deref())
        .await
    {
        Ok(reference) => ("sent", Some(reference), None),
        Err(e) => {
            tracing::warn!(case_id = %case.case_id, template = %template.code, "SMS delivery failed: {}", e);
            ("failed", None, Some(e))
        }
    };

    crate::repo::communication::create(
        pool,
        NewCommunication {
            case_id: case.id,
            channel: "sms".to_string(),
            recipient: mask_mobile(&case.borrower_mobile),
            template_code: template.code,
            language_code: template.language_code,
            content,
            status: status.to_string(),
            provider_reference,
            error_message,
            created_by: actor.as_str().to_string(),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::AppErrorKind;

    #[test]
    fn language_fallback_order() {
        assert_eq!(language_candidates("mr"), vec!["mr", "en"]);
        assert_eq!(language_candidates("en"), vec!["en"]);
    }

    #[test]
    fn renders_within_limit() {
        let ctx = json!({ "case": { "borrower_name": "Ravi", "case_id": "LC-20261018-0001" } });
        let out = render_sms("Dear {{ case.borrower_name }}, ref {{ case.case_id }}. ", &ctx, 160).unwrap();
        assert_eq!(out, "Dear Ravi, ref LC-20261018-0001.");
    }

    #[test]
    fn length_limit_is_enforced() {
        let ctx = json!({ "x": "a".repeat(50) });
        let err = render_sms("{{ x }}", &ctx, 20).unwrap_err();
        assert_eq!(err.kind, AppErrorKind::ValidationError);
        assert!(err.field_errors["content"].contains("limit is 20"));
    }

    #[test]
    fn undefined_variables_are_validation_errors() {
        let err = render_sms("{{ lawyer.name }}", &json!({ "lawyer": null }), 160).unwrap_err();
        assert!(err.field_errors.contains_key("template"));
    }
}

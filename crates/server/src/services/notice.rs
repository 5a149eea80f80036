//! Notice pipeline: gather -> mask -> compliance -> render -> post-process.

use chrono::{NaiveDate, Utc};
use serde_json::{json, Map, Value};
use shared_types::{
    advances_draft_case, AppError, GeneratedNotice, GenerateNoticeRequest, Lawyer, LegalCase,
    NoticePreviewRequest, NoticePreviewResponse, NoticeSettings, NoticeTemplate,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::actor::Actor;
use crate::db::AppState;
use crate::error_convert::SqlxErrorExt;
use crate::repo::generated_notice::NewGeneratedNotice;
use crate::services::compliance::{self, RenderSubject, Violations};
use crate::services::documents::{self, GeneratedDocument, NewDocument};
use crate::services::masking;
use crate::services::template::{self, TemplateError};
use crate::typst::{notice_title, render_notice_pdf, NoticePdfParams};

/// Output of the pipeline before anything is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotice {
    pub subject: String,
    /// Post-processed content. For `pdf` templates this is the text body
    /// that goes into the PDF.
    pub content: String,
    pub masked: bool,
}

// ── Gather ──────────────────────────────────────────────────────────

/// Validate caller-supplied `extra` variables. Absent means `{}`.
pub fn extra_object(extra: Option<Value>) -> Result<Value, AppError> {
    match extra {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(v @ Value::Object(_)) => Ok(v),
        Some(_) => Err(AppError::bad_request("extra must be a JSON object")),
    }
}

/// Build the template context for a case.
pub fn build_context(
    case: &LegalCase,
    state_name: Option<&str>,
    product_name: Option<&str>,
    lawyer: Option<&Lawyer>,
    today: NaiveDate,
    extra: Value,
) -> Value {
    let lawyer = match lawyer {
        Some(l) => json!({
            "name": l.name,
            "email": l.email,
            "phone": l.phone,
            "bar_registration_number": l.bar_registration_number,
        }),
        None => Value::Null,
    };

    json!({
        "case": {
            "case_id": case.case_id,
            "loan_account_number": case.loan_account_number,
            "borrower_name": case.borrower_name,
            "borrower_mobile": case.borrower_mobile,
            "borrower_email": case.borrower_email,
            "borrower_address": case.borrower_address,
            "state_code": case.state_code,
            "product_code": case.product_code,
            "language_code": case.language_code,
            "dpd": case.dpd,
            "outstanding_amount": case.outstanding_amount,
            "outstanding_amount_display": format!("{:.2}", case.outstanding_amount),
            "case_type": case.case_type,
            "status": case.status,
            "court_name": case.court_name,
            "court_case_number": case.court_case_number,
            "filing_date": case.filing_date.map(|d| d.to_string()),
            "next_hearing_date": case.next_hearing_date.map(|d| d.to_string()),
        },
        "state": { "code": case.state_code, "name": state_name.unwrap_or(&case.state_code) },
        "product": { "code": case.product_code, "name": product_name.unwrap_or(&case.product_code) },
        "lawyer": lawyer,
        "today": today.to_string(),
        "extra": extra,
    })
}

/// Deep-merge `overlay` into `base`. Objects merge key by key, anything
/// else replaces.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Load everything a case's context refers to.
pub async fn gather_context(
    pool: &Pool<Postgres>,
    case: &LegalCase,
    extra: Value,
) -> Result<Value, AppError> {
    let state = crate::repo::state::find_by_code(pool, &case.state_code).await?;
    let product = crate::repo::product::find_by_code(pool, &case.product_code).await?;
    let lawyer = match case.assigned_lawyer_id {
        Some(id) => crate::repo::lawyer::find_by_id(pool, id).await?,
        None => None,
    };

    Ok(build_context(
        case,
        state.as_ref().map(|s| s.name.as_str()),
        product.as_ref().map(|p| p.name.as_str()),
        lawyer.as_ref(),
        Utc::now().date_naive(),
        extra,
    ))
}

// ── Render / post-process ───────────────────────────────────────────

fn normalize_text(body: &str) -> String {
    body.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn wrap_html(subject: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        tera::escape_html(subject),
        body.trim()
    )
}

/// Format-specific finishing of a rendered body.
pub fn post_process(output_format: &str, subject: &str, body: &str) -> String {
    match output_format {
        "html" => wrap_html(subject, body),
        _ => normalize_text(body),
    }
}

/// Run mask, compliance, render and post-process over an already gathered
/// context. Pure: nothing is loaded or stored.
pub fn render_notice(
    template: &NoticeTemplate,
    mut context: Value,
    mask: bool,
    settings: &NoticeSettings,
    subject: &RenderSubject,
) -> Result<RenderedNotice, AppError> {
    if mask {
        masking::mask_context(&mut context, &settings.masked_fields);
    }

    let mut violations = Violations::new();
    compliance::check_before_render(template, &context, subject, &mut violations);

    let autoescape = template.output_format == "html";
    let rendered_subject = render_part(&template.subject, &context, false, "subject", &mut violations)?;
    let rendered_body = render_part(&template.body, &context, autoescape, "template", &mut violations)?;

    if let Some(body) = rendered_body.as_deref() {
        compliance::check_after_render(body, settings.max_body_chars, &mut violations);
    }

    violations.into_result()?;

    let subject_text = rendered_subject.unwrap_or_default().trim().to_string();
    let body = rendered_body.unwrap_or_default();
    Ok(RenderedNotice {
        content: post_process(&template.output_format, &subject_text, &body),
        subject: subject_text,
        masked: mask,
    })
}

/// Render one template part. Syntax errors abort with 400, render errors
/// are recorded as violations.
fn render_part(
    source: &str,
    context: &Value,
    autoescape: bool,
    field: &str,
    violations: &mut Violations,
) -> Result<Option<String>, AppError> {
    match template::render(source, context, autoescape) {
        Ok(out) => Ok(Some(out)),
        Err(TemplateError::Syntax(msg)) => {
            Err(AppError::bad_request(format!("Template syntax error in {}: {}", field, msg)))
        }
        Err(TemplateError::Render(msg)) => {
            violations.push(field, msg);
            Ok(None)
        }
    }
}

async fn language_active(pool: &Pool<Postgres>, code: &str) -> Result<bool, AppError> {
    Ok(crate::repo::language::find_by_code(pool, code)
        .await?
        .is_some_and(|l| l.is_active))
}

// ── Operations ──────────────────────────────────────────────────────

/// Render a template against a case and/or sample data without persisting.
pub async fn preview(
    pool: &Pool<Postgres>,
    settings: &NoticeSettings,
    template: &NoticeTemplate,
    req: NoticePreviewRequest,
) -> Result<NoticePreviewResponse, AppError> {
    let sample = match req.sample {
        None | Some(Value::Null) => None,
        Some(v @ Value::Object(_)) => Some(v),
        Some(_) => return Err(AppError::bad_request("sample must be a JSON object")),
    };

    let (context, case_status) = match (req.case_id, sample) {
        (Some(case_id), sample) => {
            let case = crate::repo::legal_case::find_by_id(pool, case_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", case_id)))?;
            let mut context = gather_context(pool, &case, Value::Object(Map::new())).await?;
            if let Some(sample) = sample {
                merge_json(&mut context, sample);
            }
            (context, Some(case.status))
        }
        (None, Some(sample)) => (sample, None),
        (None, None) => return Err(AppError::bad_request("Either case_id or sample is required")),
    };

    let subject = RenderSubject {
        case_status,
        language_active: language_active(pool, &template.language_code).await?,
    };
    let mask = req.mask.unwrap_or(settings.mask_by_default);
    let rendered = render_notice(template, context, mask, settings, &subject)?;

    Ok(NoticePreviewResponse {
        subject: rendered.subject,
        content: rendered.content,
        output_format: template.output_format.clone(),
        masked: rendered.masked,
    })
}

/// Render a notice for a case and persist it. PDF notices are also stored
/// as a `legal_notice` case document.
pub async fn generate(
    state: &AppState,
    settings: &NoticeSettings,
    case: &LegalCase,
    req: GenerateNoticeRequest,
    actor: &Actor,
) -> Result<GeneratedNotice, AppError> {
    let pool = &state.pool;
    let template = crate::repo::notice_template::find_by_code(pool, &req.template_code)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Notice template {} not found", req.template_code))
        })?;

    let extra = extra_object(req.extra)?;
    let context = gather_context(pool, case, extra).await?;
    let lawyer_name = compliance::lookup_path(&context, "lawyer.name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let subject = RenderSubject {
        case_status: Some(case.status.clone()),
        language_active: language_active(pool, &template.language_code).await?,
    };
    let mask = req.mask.unwrap_or(settings.mask_by_default);
    let rendered = render_notice(&template, context, mask, settings, &subject)?;

    let staged = if template.output_format == "pdf" {
        let pdf = render_notice_pdf(&NoticePdfParams {
            case_id: case.case_id.clone(),
            notice_title: notice_title(&template.notice_type),
            subject: rendered.subject.clone(),
            content_body: rendered.content.clone(),
            issued_on: Utc::now().date_naive().to_string(),
            lawyer_name,
        })
        .await?;

        let doc = documents::stage_generated(
            state,
            NewDocument {
                case_id: case.id,
                document_type: "legal_notice".to_string(),
                file_name: format!("{}-{}-v{}.pdf", case.case_id, template.code, template.version),
                content_type: "application/pdf".to_string(),
                description: Some(rendered.subject.clone()),
                uploaded_by: actor.as_str().to_string(),
            },
            pdf,
        )
        .await?;
        Some(doc)
    } else {
        None
    };

    let result = persist(pool, case.id, &template, rendered, staged.as_ref(), actor).await;
    if result.is_err() {
        if let Some(doc) = &staged {
            doc.discard(state).await;
        }
    }
    let notice = result?;

    tracing::info!(
        case_id = %case.case_id,
        template = %template.code,
        version = template.version,
        format = %template.output_format,
        "notice generated"
    );
    Ok(notice)
}

/// Record the notice, its PDF document and any draft advance in one
/// transaction. The case status is re-read under the row lock.
async fn persist(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    template: &NoticeTemplate,
    rendered: RenderedNotice,
    document: Option<&GeneratedDocument>,
    actor: &Actor,
) -> Result<GeneratedNotice, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let case = crate::repo::legal_case::lock(&mut *tx, case_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Legal case {} not found", case_id)))?;

    if case.is_read_only() {
        let mut violations = Violations::new();
        violations.push("case", format!("notices cannot be issued on a {} case", case.status));
        violations.into_result()?;
    }

    let document_id = match document {
        Some(doc) => Some(doc.insert(&mut *tx).await?.id),
        None => None,
    };

    let notice = crate::repo::generated_notice::create(
        &mut *tx,
        NewGeneratedNotice {
            case_id,
            template_id: template.id,
            template_version: template.version,
            output_format: template.output_format.clone(),
            subject: rendered.subject,
            content: rendered.content,
            document_id,
            masked: rendered.masked,
            generated_by: actor.as_str().to_string(),
        },
    )
    .await?;

    if case.status == "draft" && advances_draft_case(&template.notice_type) {
        let remarks = format!("{} issued", template.code);
        crate::repo::legal_case::set_status(&mut *tx, case_id, "notice_sent", None, actor.as_str())
            .await?;
        crate::repo::legal_case::insert_history(
            &mut *tx,
            case_id,
            Some("draft"),
            "notice_sent",
            Some(remarks.as_str()),
            actor.as_str(),
        )
        .await?;
        tracing::info!(case_id = %case.case_id, "case moved to notice_sent");
    }

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(notice)
}

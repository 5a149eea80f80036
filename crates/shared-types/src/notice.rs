use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

/// Valid notice types matching the DB CHECK constraint.
pub const NOTICE_TYPES: &[&str] = &[
    "demand_notice",
    "section_138_notice",
    "arbitration_notice",
    "sarfaesi_13_2_notice",
    "hearing_reminder",
];

/// Output formats a notice template can produce.
pub const OUTPUT_FORMATS: &[&str] = &["text", "html", "pdf"];

pub fn is_valid_notice_type(s: &str) -> bool {
    NOTICE_TYPES.contains(&s)
}

pub fn is_valid_output_format(s: &str) -> bool {
    OUTPUT_FORMATS.contains(&s)
}

/// Notice types whose issue on a draft case moves it to `notice_sent`.
pub fn advances_draft_case(notice_type: &str) -> bool {
    matches!(notice_type, "demand_notice" | "section_138_notice")
}

/// A versioned notice template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct NoticeTemplate {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub notice_type: String,
    pub language_code: String,
    pub output_format: String,
    pub subject: String,
    pub body: String,
    /// Dotted context paths that must be present and non-empty.
    pub required_fields: Vec<String>,
    pub version: i32,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A notice produced for a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct GeneratedNotice {
    pub id: Uuid,
    pub case_id: Uuid,
    pub template_id: Uuid,
    pub template_version: i32,
    pub output_format: String,
    pub subject: String,
    pub content: String,
    /// Stored PDF, for `pdf` output only.
    pub document_id: Option<Uuid>,
    pub masked: bool,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoticeTemplateResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub notice_type: String,
    pub language_code: String,
    pub output_format: String,
    pub subject: String,
    pub body: String,
    pub required_fields: Vec<String>,
    pub version: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<NoticeTemplate> for NoticeTemplateResponse {
    fn from(t: NoticeTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            code: t.code,
            name: t.name,
            notice_type: t.notice_type,
            language_code: t.language_code,
            output_format: t.output_format,
            subject: t.subject,
            body: t.body,
            required_fields: t.required_fields,
            version: t.version,
            is_active: t.is_active,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeneratedNoticeResponse {
    pub id: String,
    pub case_id: String,
    pub template_id: String,
    pub template_version: i32,
    pub output_format: String,
    pub subject: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub masked: bool,
    pub generated_by: String,
    pub generated_at: String,
}

impl From<GeneratedNotice> for GeneratedNoticeResponse {
    fn from(n: GeneratedNotice) -> Self {
        Self {
            id: n.id.to_string(),
            case_id: n.case_id.to_string(),
            template_id: n.template_id.to_string(),
            template_version: n.template_version,
            output_format: n.output_format,
            subject: n.subject,
            content: n.content,
            document_id: n.document_id.map(|d| d.to_string()),
            masked: n.masked,
            generated_by: n.generated_by,
            generated_at: n.generated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateNoticeTemplateRequest {
    pub code: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))
    )]
    pub name: String,
    pub notice_type: String,
    pub language_code: String,
    pub output_format: String,
    #[serde(default)]
    pub subject: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "body must not be empty"))
    )]
    pub body: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateNoticeTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Render a template without persisting anything.
///
/// Either `case_id` or `sample` must be supplied; with `case_id` the
/// context is gathered from the case and `sample` is merged on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoticePreviewRequest {
    #[serde(default)]
    pub case_id: Option<Uuid>,
    #[serde(default)]
    pub sample: Option<serde_json::Value>,
    /// Overrides `notices.mask_by_default`.
    #[serde(default)]
    pub mask: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoticePreviewResponse {
    pub subject: String,
    pub content: String,
    pub output_format: String,
    pub masked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateNoticeRequest {
    pub template_code: String,
    /// Extra variables exposed as `extra.*` in the template.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
    #[serde(default)]
    pub mask: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_types_and_formats() {
        assert!(is_valid_notice_type("sarfaesi_13_2_notice"));
        assert!(!is_valid_notice_type("summons"));
        assert!(is_valid_output_format("pdf"));
        assert!(!is_valid_output_format("docx"));
    }

    #[test]
    fn only_demand_style_notices_advance_drafts() {
        assert!(advances_draft_case("demand_notice"));
        assert!(advances_draft_case("section_138_notice"));
        assert!(!advances_draft_case("hearing_reminder"));
        assert!(!advances_draft_case("arbitration_notice"));
    }
}

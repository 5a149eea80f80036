use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An SMS template variant for one language.
///
/// `(code, language_code)` is unique among non-deleted rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct SmsTemplate {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub language_code: String,
    pub body: String,
    /// Registration id issued by the telecom regulator for this template.
    pub dlt_template_id: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SmsTemplateResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub language_code: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dlt_template_id: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SmsTemplate> for SmsTemplateResponse {
    fn from(t: SmsTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            code: t.code,
            name: t.name,
            language_code: t.language_code,
            body: t.body,
            dlt_template_id: t.dlt_template_id,
            is_active: t.is_active,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateSmsTemplateRequest {
    pub code: String,
    pub name: String,
    pub language_code: String,
    pub body: String,
    #[serde(default)]
    pub dlt_template_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateSmsTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dlt_template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Variables to render an SMS template with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SmsPreviewRequest {
    #[serde(default)]
    pub variables: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SmsPreviewResponse {
    pub content: String,
    pub length: usize,
    /// Number of 160-character segments the message occupies.
    pub segments: usize,
}

/// Count GSM-style 160-char segments (153 per part once concatenated).
pub fn sms_segments(len: usize) -> usize {
    match len {
        0 => 0,
        1..=160 => 1,
        n => n.div_ceil(153),
    }
}

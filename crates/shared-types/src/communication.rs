use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COMMUNICATION_STATUSES: &[&str] = &["queued", "sent", "failed"];

/// Language tried when a template has no variant in the case's language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// An outbound message to a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Communication {
    pub id: Uuid,
    pub case_id: Uuid,
    pub channel: String,
    /// Stored masked.
    pub recipient: String,
    pub template_code: String,
    pub language_code: String,
    pub content: String,
    pub status: String,
    pub provider_reference: Option<String>,
    pub error_message: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunicationResponse {
    pub id: String,
    pub case_id: String,
    pub channel: String,
    pub recipient: String,
    pub template_code: String,
    pub language_code: String,
    pub content: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl From<Communication> for CommunicationResponse {
    fn from(c: Communication) -> Self {
        Self {
            id: c.id.to_string(),
            case_id: c.case_id.to_string(),
            channel: c.channel,
            recipient: c.recipient,
            template_code: c.template_code,
            language_code: c.language_code,
            content: c.content,
            status: c.status,
            provider_reference: c.provider_reference,
            error_message: c.error_message,
            created_by: c.created_by,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendSmsRequest {
    pub template_code: String,
    /// Extra variables exposed as `extra.*` in the template.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

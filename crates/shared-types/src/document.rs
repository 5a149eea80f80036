use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Valid case document types matching the DB CHECK constraint.
pub const DOCUMENT_TYPES: &[&str] = &[
    "vakalatnama",
    "legal_notice",
    "petition",
    "court_order",
    "evidence",
    "affidavit",
    "other",
];

pub fn is_valid_document_type(s: &str) -> bool {
    DOCUMENT_TYPES.contains(&s)
}

/// A file name is usable as the last segment of a storage key.
pub fn is_safe_file_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed.len() <= 255
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\', '\0'])
}

/// Object-store key for a case document.
pub fn document_storage_key(case_id: Uuid, document_id: Uuid, file_name: &str) -> String {
    format!("cases/{}/{}/{}", case_id, document_id, file_name)
}

/// A document attached to a legal case (metadata only, no blob).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseDocument {
    pub id: Uuid,
    pub case_id: Uuid,
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Lowercase hex SHA-256 of the stored bytes.
    pub sha256: String,
    pub storage_key: String,
    pub description: Option<String>,
    pub uploaded_by: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseDocumentResponse {
    pub id: String,
    pub case_id: String,
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub uploaded_by: String,
    pub created_at: String,
}

impl From<CaseDocument> for CaseDocumentResponse {
    fn from(d: CaseDocument) -> Self {
        Self {
            id: d.id.to_string(),
            case_id: d.case_id.to_string(),
            document_type: d.document_type,
            file_name: d.file_name,
            content_type: d.content_type,
            size_bytes: d.size_bytes,
            sha256: d.sha256,
            description: d.description,
            uploaded_by: d.uploaded_by,
            created_at: d.created_at.to_rfc3339(),
        }
    }
}

/// JSON upload body. `content` is standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadDocumentRequest {
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
}

use base64::Engine;
use sha2::{Digest, Sha256};
use shared_types::{
    document_storage_key, is_safe_file_name, is_valid_document_type, AppError, CaseDocument,
    DocumentSettings, UploadDocumentRequest, DOCUMENT_TYPES,
};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::AppState;
use crate::storage::ObjectStore;

pub use crate::repo::document::NewDocument;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Validate an upload body and decode its content.
pub fn decode_upload(
    req: &UploadDocumentRequest,
    settings: &DocumentSettings,
) -> Result<Vec<u8>, AppError> {
    if !is_valid_document_type(&req.document_type) {
        return Err(AppError::invalid_choice(
            "document_type",
            &req.document_type,
            DOCUMENT_TYPES,
        ));
    }

    if !is_safe_file_name(&req.file_name) {
        return Err(AppError::field(
            "file_name",
            "file_name must be non-empty and must not contain path separators",
        ));
    }

    if !settings
        .allowed_content_types
        .iter()
        .any(|ct| ct.eq_ignore_ascii_case(req.content_type.trim()))
    {
        return Err(AppError::bad_request(format!(
            "Content type {} is not allowed",
            req.content_type
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.content.trim())
        .map_err(|_| AppError::bad_request("content is not valid base64"))?;

    if bytes.is_empty() {
        return Err(AppError::field("content", "content must not be empty"));
    }
    if bytes.len() > settings.max_size_bytes {
        return Err(AppError::field(
            "content",
            format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                settings.max_size_bytes
            ),
        ));
    }

    Ok(bytes)
}

/// Upload a document to a case. Identical content on the same case is a 409.
pub async fn upload(
    state: &AppState,
    settings: &DocumentSettings,
    case_id: Uuid,
    req: UploadDocumentRequest,
    uploaded_by: &str,
) -> Result<CaseDocument, AppError> {
    let bytes = decode_upload(&req, settings)?;
    let sha256 = sha256_hex(&bytes);

    if let Some(existing) =
        crate::repo::document::find_by_checksum(&state.pool, case_id, &sha256).await?
    {
        return Err(AppError::conflict(format!(
            "Document with identical content already attached to this case ({})",
            existing.id
        )));
    }

    let new = NewDocument {
        case_id,
        document_type: req.document_type,
        file_name: req.file_name.trim().to_string(),
        content_type: req.content_type.trim().to_ascii_lowercase(),
        description: req.description,
        uploaded_by: uploaded_by.to_string(),
    };
    store(state, new, bytes, sha256).await
}

/// A server-generated file headed for a case.
#[derive(Debug)]
pub enum GeneratedDocument {
    /// Identical content is already attached to the case.
    Existing(CaseDocument),
    /// Bytes are in the object store; the metadata row is not written yet.
    Staged(StagedDocument),
}

#[derive(Debug)]
pub struct StagedDocument {
    id: Uuid,
    key: String,
    new: NewDocument,
    size_bytes: i64,
    sha256: String,
}

impl GeneratedDocument {
    /// Write the metadata row for a staged file, or hand back the existing
    /// document.
    pub async fn insert<'e, E>(&self, ex: E) -> Result<CaseDocument, AppError>
    where
        E: PgExecutor<'e>,
    {
        match self {
            Self::Existing(doc) => Ok(doc.clone()),
            Self::Staged(staged) => {
                crate::repo::document::create(
                    ex,
                    staged.id,
                    &staged.new,
                    staged.size_bytes,
                    &staged.sha256,
                    &staged.key,
                )
                .await
            }
        }
    }

    /// Remove a staged object whose metadata row was never committed.
    pub async fn discard(&self, state: &AppState) {
        if let Self::Staged(staged) = self {
            if let Err(e) = state.store.delete(&staged.key).await {
                tracing::warn!(key = %staged.key, "failed to remove orphaned object: {}", e);
            }
        }
    }
}

/// Put a server-generated file in the object store without recording it.
/// Identical content already on the case is reused instead of rejected.
pub async fn stage_generated(
    state: &AppState,
    new: NewDocument,
    bytes: Vec<u8>,
) -> Result<GeneratedDocument, AppError> {
    let sha256 = sha256_hex(&bytes);
    if let Some(existing) =
        crate::repo::document::find_by_checksum(&state.pool, new.case_id, &sha256).await?
    {
        return Ok(GeneratedDocument::Existing(existing));
    }

    let id = Uuid::new_v4();
    let key = document_storage_key(new.case_id, id, &new.file_name);
    let size_bytes = bytes.len() as i64;
    state
        .store
        .put(&key, &new.content_type, bytes)
        .await
        .map_err(|e| AppError::storage(format!("Failed to store document: {}", e)))?;

    Ok(GeneratedDocument::Staged(StagedDocument {
        id,
        key,
        new,
        size_bytes,
        sha256,
    }))
}

async fn store(
    state: &AppState,
    new: NewDocument,
    bytes: Vec<u8>,
    sha256: String,
) -> Result<CaseDocument, AppError> {
    let id = Uuid::new_v4();
    let key = document_storage_key(new.case_id, id, &new.file_name);
    let size_bytes = bytes.len() as i64;

    state
        .store
        .put(&key, &new.content_type, bytes)
        .await
        .map_err(|e| AppError::storage(format!("Failed to store document: {}", e)))?;

    match crate::repo::document::create(&state.pool, id, &new, size_bytes, &sha256, &key).await {
        Ok(doc) => {
            tracing::info!(
                document_id = %doc.id,
                case_id = %doc.case_id,
                size_bytes,
                backend = state.store.backend_name(),
                "document stored"
            );
            Ok(doc)
        }
        Err(err) => {
            if let Err(e) = state.store.delete(&key).await {
                tracing::warn!(key = %key, "failed to remove orphaned object: {}", e);
            }
            Err(err)
        }
    }
}

/// Fetch the stored bytes of a document. A metadata row whose object has
/// gone missing is a 404.
pub async fn read_content(state: &AppState, doc: &CaseDocument) -> Result<Vec<u8>, AppError> {
    let exists = state
        .store
        .head(&doc.storage_key)
        .await
        .map_err(|e| AppError::storage(format!("Failed to read document: {}", e)))?;
    if !exists {
        tracing::warn!(document_id = %doc.id, key = %doc.storage_key, "stored object missing");
        return Err(AppError::not_found(format!(
            "Stored file for document {} is missing",
            doc.id
        )));
    }

    state
        .store
        .get(&doc.storage_key)
        .await
        .map_err(|e| AppError::storage(format!("Failed to read document: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::AppErrorKind;

    fn req(content: &str) -> UploadDocumentRequest {
        UploadDocumentRequest {
            document_type: "vakalatnama".to_string(),
            file_name: "vakalatnama.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: content.to_string(),
            description: None,
        }
    }

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn checksum_is_lower_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn valid_upload_decodes() {
        let bytes = decode_upload(&req(&b64(b"%PDF-1.7")), &DocumentSettings::default()).unwrap();
        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[test]
    fn rejects_bad_base64() {
        let err = decode_upload(&req("not base64!!"), &DocumentSettings::default()).unwrap_err();
        assert_eq!(err.kind, AppErrorKind::BadRequest);
    }

    #[test]
    fn rejects_empty_and_oversized() {
        let err = decode_upload(&req(""), &DocumentSettings::default()).unwrap_err();
        assert!(err.field_errors.contains_key("content"));

        let settings = DocumentSettings {
            max_size_bytes: 4,
            ..DocumentSettings::default()
        };
        let err = decode_upload(&req(&b64(b"12345")), &settings).unwrap_err();
        assert!(err.message.contains("limit is 4"));
    }

    #[test]
    fn rejects_path_separators_and_unknown_types() {
        let mut r = req(&b64(b"x"));
        r.file_name = "../etc/passwd".to_string();
        assert!(decode_upload(&r, &DocumentSettings::default()).is_err());

        let mut r = req(&b64(b"x"));
        r.content_type = "application/x-msdownload".to_string();
        let err = decode_upload(&r, &DocumentSettings::default()).unwrap_err();
        assert!(err.message.contains("not allowed"));

        let mut r = req(&b64(b"x"));
        r.document_type = "selfie".to_string();
        let err = decode_upload(&r, &DocumentSettings::default()).unwrap_err();
        assert!(err.message.starts_with("Invalid document_type"));
    }
}

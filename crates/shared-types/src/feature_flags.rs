use serde::{Deserialize, Serialize};

/// Feature flags controlling which optional integrations are active.
///
/// Loaded from `config.toml` at server startup. Every field defaults to
/// `false` so that a missing or incomplete config file disables all
/// optional integrations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeatureFlags {
    /// Store case documents in S3 instead of the local filesystem.
    #[serde(default)]
    pub s3: bool,
    /// Deliver SMS through the HTTP gateway instead of the logging stub.
    #[serde(default)]
    pub sms_gateway: bool,
    #[serde(default)]
    pub telemetry: bool,
}

/// Notice-generation settings (`[notices]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoticeSettings {
    /// Mask borrower PII when the caller does not say otherwise.
    #[serde(default = "default_true")]
    pub mask_by_default: bool,
    /// Context keys replaced by the masking step.
    #[serde(default = "default_masked_fields")]
    pub masked_fields: Vec<String>,
    /// Upper bound on a rendered notice body, in characters.
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    /// Upper bound on a rendered SMS, in characters.
    #[serde(default = "default_sms_max_chars")]
    pub sms_max_chars: usize,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            mask_by_default: true,
            masked_fields: default_masked_fields(),
            max_body_chars: default_max_body_chars(),
            sms_max_chars: default_sms_max_chars(),
        }
    }
}

/// Case-document upload settings (`[documents]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentSettings {
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Root directory for the filesystem object store.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_content_types: default_allowed_content_types(),
            storage_dir: default_storage_dir(),
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub notices: NoticeSettings,
    #[serde(default)]
    pub documents: DocumentSettings,
}

fn default_true() -> bool {
    true
}

fn default_masked_fields() -> Vec<String> {
    vec![
        "borrower_mobile".to_string(),
        "borrower_email".to_string(),
        "loan_account_number".to_string(),
    ]
}

fn default_max_body_chars() -> usize {
    20_000
}

fn default_sms_max_chars() -> usize {
    480
}

fn default_max_size_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "application/pdf",
        "image/jpeg",
        "image/png",
        "text/plain",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_storage_dir() -> String {
    "./data/documents".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_flags_all_false() {
        let flags = FeatureFlags::default();
        assert!(!flags.s3);
        assert!(!flags.sms_gateway);
        assert!(!flags.telemetry);
    }

    #[test]
    fn deserialize_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.notices.mask_by_default);
        assert_eq!(config.notices.max_body_chars, 20_000);
        assert_eq!(config.documents.max_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn deserialize_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [features]
            sms_gateway = true

            [notices]
            mask_by_default = false
            sms_max_chars = 160
            "#,
        )
        .unwrap();
        assert!(config.features.sms_gateway);
        assert!(!config.features.s3);
        assert!(!config.notices.mask_by_default);
        assert_eq!(config.notices.sms_max_chars, 160);
        assert_eq!(config.notices.masked_fields, default_masked_fields());
    }

    #[test]
    fn deserialize_document_settings() {
        let config: AppConfig = toml::from_str(
            r#"
            [documents]
            max_size_bytes = 1024
            allowed_content_types = ["application/pdf"]
            storage_dir = "/var/lib/legal-docs"
            "#,
        )
        .unwrap();
        assert_eq!(config.documents.max_size_bytes, 1024);
        assert_eq!(config.documents.allowed_content_types, vec!["application/pdf"]);
        assert_eq!(config.documents.storage_dir, "/var/lib/legal-docs");
    }

    #[test]
    fn deserialize_json_with_missing_fields_defaults() {
        let flags: FeatureFlags = serde_json::from_str("{}").unwrap();
        assert_eq!(flags, FeatureFlags::default());
    }
}

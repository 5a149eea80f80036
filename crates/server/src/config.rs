use shared_types::{AppConfig, DocumentSettings, FeatureFlags, NoticeSettings};
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

/// Read `config.toml` and store it in the global `OnceLock`. Safe to call
/// multiple times; only the first call has effect.
///
/// If the file is missing or unparseable, every section falls back to its
/// defaults.
pub fn load_config() {
    CONFIG.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => {
            let config = parse_config(&contents);
            tracing::info!(features = ?config.features, "loaded {CONFIG_PATH}");
            config
        }
        Err(e) => {
            tracing::warn!("{CONFIG_PATH} not found ({e}), using defaults");
            AppConfig::default()
        }
    });
}

/// Parse config text, falling back to defaults on error.
pub fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::error!("failed to parse {CONFIG_PATH}: {e}, using defaults");
        AppConfig::default()
    })
}

/// The loaded configuration, or defaults if `load_config()` hasn't run.
pub fn app_config() -> &'static AppConfig {
    static DEFAULT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(AppConfig::default))
}

pub fn feature_flags() -> &'static FeatureFlags {
    &app_config().features
}

pub fn notice_settings() -> &'static NoticeSettings {
    &app_config().notices
}

pub fn document_settings() -> &'static DocumentSettings {
    &app_config().documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let config = parse_config("[features\ns3 = ");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn unloaded_config_reads_defaults() {
        assert!(notice_settings().max_body_chars > 0);
        assert!(!document_settings().allowed_content_types.is_empty());
    }
}

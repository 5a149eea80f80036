use std::path::{Component, Path, PathBuf};

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::ServerSideEncryption,
    Client,
};

/// Read an env var, trying the primary name first then a fallback.
pub fn env_or(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .or_else(|| std::env::var(fallback).ok())
}

/// Bucket name for case documents (from env or default).
fn documents_bucket() -> String {
    env_or("DOCUMENTS_BUCKET", "S3_BUCKET").unwrap_or_else(|| "case-documents".to_string())
}

// ── Trait ────────────────────────────────────────────────────────────

/// Blob storage for case documents, addressed by storage key.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, replacing any existing object.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), String>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, String>;

    /// Check if an object exists.
    async fn head(&self, key: &str) -> Result<bool, String>;

    /// Remove an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;
}

// ── S3 implementation ───────────────────────────────────────────────

/// S3-compatible object store (AWS, MinIO, Tigris).
/// All uploads are encrypted with SSE-S3 (AES256).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a new S3ObjectStore from environment variables.
    ///
    /// Supports both `AWS_*` and local MinIO `S3_*` naming:
    ///   - `AWS_ENDPOINT_URL_S3`   / `S3_ENDPOINT`
    ///   - `AWS_ACCESS_KEY_ID`     / `S3_ACCESS_KEY`
    ///   - `AWS_SECRET_ACCESS_KEY` / `S3_SECRET_KEY`
    ///   - `AWS_REGION`            / `S3_REGION`
    pub fn from_env() -> Result<Self, String> {
        let endpoint = env_or("AWS_ENDPOINT_URL_S3", "S3_ENDPOINT")
            .ok_or("AWS_ENDPOINT_URL_S3 or S3_ENDPOINT must be set")?;
        let access_key = env_or("AWS_ACCESS_KEY_ID", "S3_ACCESS_KEY")
            .ok_or("AWS_ACCESS_KEY_ID or S3_ACCESS_KEY must be set")?;
        let secret_key = env_or("AWS_SECRET_ACCESS_KEY", "S3_SECRET_KEY")
            .ok_or("AWS_SECRET_ACCESS_KEY or S3_SECRET_KEY must be set")?;
        let region =
            env_or("AWS_REGION", "S3_REGION").unwrap_or_else(|| "ap-south-1".to_string());

        let creds = Credentials::new(&access_key, &secret_key, None, None, "env");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&endpoint)
            .region(Region::new(region))
            .credentials_provider(creds)
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: documents_bucket(),
        })
    }

    /// Ensure the documents bucket exists.
    pub async fn ensure_bucket(&self) {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if !exists {
            tracing::info!("Creating documents bucket '{}'...", self.bucket);
            match self.client.create_bucket().bucket(&self.bucket).send().await {
                Ok(_) => tracing::info!("Documents bucket '{}' created", self.bucket),
                Err(e) => tracing::warn!(
                    "Failed to create documents bucket '{}': {}",
                    self.bucket,
                    e
                ),
            }
        }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                tracing::error!("S3 PutObject failed for key '{}': {:?}", key, svc);
                format!("S3 upload failed: {}", svc)
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                tracing::error!("S3 GetObject failed for key '{}': {:?}", key, svc);
                format!("S3 download failed: {}", svc)
            })?;

        resp.body
            .collect()
            .await
            .map(|data| data.into_bytes().to_vec())
            .map_err(|e| format!("Failed to read S3 response body: {}", e))
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let svc_err = e.into_service_error();
                if svc_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(format!("HEAD failed: {}", svc_err))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("DELETE failed: {}", e))?;
        Ok(())
    }
}

// ── Filesystem implementation ───────────────────────────────────────

/// Stores objects as plain files below a root directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn path_for(&self, key: &str) -> Result<PathBuf, String> {
        let rel = Path::new(key);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(format!("Invalid storage key: {}", key));
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, _content_type: &str, body: Vec<u8>) -> Result<(), String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| format!("Failed to stat {}: {}", path.display(), e))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to delete {}: {}", path.display(), e)),
        }
    }
}

// ── Backend selection ───────────────────────────────────────────────

/// The configured document store.
pub enum DocumentStore {
    S3(S3ObjectStore),
    Local(LocalObjectStore),
}

impl DocumentStore {
    /// S3 when `features.s3` is on, otherwise the filesystem store under
    /// `documents.storage_dir`.
    pub async fn from_config() -> Result<Self, String> {
        if crate::config::feature_flags().s3 {
            let store = S3ObjectStore::from_env()?;
            store.ensure_bucket().await;
            Ok(Self::S3(store))
        } else {
            let dir = &crate::config::document_settings().storage_dir;
            Ok(Self::Local(LocalObjectStore::new(dir)))
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::Local(_) => "local",
        }
    }
}

impl ObjectStore for DocumentStore {
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), String> {
        match self {
            Self::S3(s) => s.put(key, content_type, body).await,
            Self::Local(s) => s.put(key, content_type, body).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        match self {
            Self::S3(s) => s.get(key).await,
            Self::Local(s) => s.get(key).await,
        }
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        match self {
            Self::S3(s) => s.head(key).await,
            Self::Local(s) => s.head(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        match self {
            Self::S3(s) => s.delete(key).await,
            Self::Local(s) => s.delete(key).await,
        }
    }
}

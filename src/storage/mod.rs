use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    config::UploadConfig,
    error::{AppError, Result},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

const MAX_NAME_LEN: usize = 100;

/// What an uploaded file is for. Decides where it lands and which types are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    PaymentScreenshot,
    AiDetectionScreenshot,
    AssignmentAttachment,
}

impl UploadKind {
    pub fn subdir(&self) -> &'static str {
        match self {
            UploadKind::PaymentScreenshot => "payments",
            UploadKind::AiDetectionScreenshot => "ai-detection",
            UploadKind::AssignmentAttachment => "assignments",
        }
    }

    pub fn accepts(&self, extension: &str) -> bool {
        match self {
            UploadKind::PaymentScreenshot | UploadKind::AiDetectionScreenshot => {
                IMAGE_EXTENSIONS.contains(&extension)
            }
            UploadKind::AssignmentAttachment => {
                IMAGE_EXTENSIONS.contains(&extension) || DOCUMENT_EXTENSIONS.contains(&extension)
            }
        }
    }

    fn allowed(&self) -> String {
        match self {
            UploadKind::PaymentScreenshot | UploadKind::AiDetectionScreenshot => {
                IMAGE_EXTENSIONS.join(", ")
            }
            UploadKind::AssignmentAttachment => {
                [IMAGE_EXTENSIONS, DOCUMENT_EXTENSIONS].concat().join(", ")
            }
        }
    }
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Durable blob storage for uploads. Returns the URI the file is served from.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String>;
    async fn delete(&self, uri: &str) -> Result<()>;
}

/// Stores files on local disk under `<dir>/<subdir>/<millis>-<name>`.
pub struct LocalFileStore {
    root: PathBuf,
    public_prefix: String,
    max_file_size: usize,
}

impl LocalFileStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_file_size: config.max_file_size_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large (max {} MB)",
                self.max_file_size / (1024 * 1024)
            )));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

        if !kind.accepts(&extension) {
            return Err(AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                kind.allowed()
            )));
        }

        Ok(extension)
    }

    /// Maps a served URI back to its path on disk, refusing anything outside the root.
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let relative = uri.strip_prefix(&self.public_prefix)?.trim_start_matches('/');
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String> {
        self.validate(kind, filename, data)?;

        let dir = self.root.join(kind.subdir());
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Storage(format!("Failed to create uploads directory: {}", e))
        })?;

        let name = sanitize_filename(filename);
        let mut key = format!("{}-{}", Utc::now().timestamp_millis(), name);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&key))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Same name within the same millisecond.
                let salt = Uuid::new_v4().simple().to_string();
                key = format!("{}-{}-{}", Utc::now().timestamp_millis(), &salt[..8], name);
                fs::File::create(dir.join(&key)).await.map_err(|e| {
                    AppError::Storage(format!("Failed to create file: {}", e))
                })?
            }
            Err(e) => return Err(AppError::Storage(format!("Failed to create file: {}", e))),
        };

        file.write_all(data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write file: {}", e))
        })?;
        file.flush().await.map_err(|e| {
            AppError::Storage(format!("Failed to write file: {}", e))
        })?;

        let uri = format!("{}/{}/{}", self.public_prefix, kind.subdir(), key);
        tracing::debug!("Stored upload {} ({} bytes)", uri, data.len());
        Ok(uri)
    }

    async fn delete(&self, uri: &str) -> Result<()> {
        let Some(path) = self.resolve(uri) else {
            return Ok(());
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path).await.map_err(|e| {
                AppError::Storage(format!("Failed to delete file: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Keeps the final path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = if cleaned.chars().count() > MAX_NAME_LEN {
        cleaned
            .chars()
            .rev()
            .take(MAX_NAME_LEN)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    } else {
        cleaned.to_string()
    };

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(max: usize) -> LocalFileStore {
        let dir = std::env::temp_dir().join(format!("assignmentpro-{}", Uuid::new_v4()));
        LocalFileStore::new(&UploadConfig {
            dir: dir.to_string_lossy().into_owned(),
            public_prefix: "/uploads".to_string(),
            max_file_size_bytes: max,
        })
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("screen shot (1).png"), "screen_shot__1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\proof.jpg"), "proof.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_kind_rules() {
        assert!(UploadKind::PaymentScreenshot.accepts("png"));
        assert!(!UploadKind::PaymentScreenshot.accepts("pdf"));
        assert!(!UploadKind::AiDetectionScreenshot.accepts("docx"));
        assert!(UploadKind::AssignmentAttachment.accepts("pdf"));
        assert!(UploadKind::AssignmentAttachment.accepts("jpg"));
        assert!(!UploadKind::AssignmentAttachment.accepts("exe"));
    }

    #[tokio::test]
    async fn test_store_and_delete() {
        let store = temp_store(1024);
        let uri = store
            .store(UploadKind::AiDetectionScreenshot, "report.PNG", b"not really a png")
            .await
            .unwrap();

        assert!(uri.starts_with("/uploads/ai-detection/"));
        assert!(uri.ends_with("-report.PNG"));

        let path = store.resolve(&uri).unwrap();
        assert!(path.exists());

        store.delete(&uri).await.unwrap();
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_store_rejects_bad_input() {
        let store = temp_store(4);

        let too_big = store
            .store(UploadKind::PaymentScreenshot, "proof.png", b"12345")
            .await;
        assert!(matches!(too_big, Err(AppError::Validation(_))));

        let wrong_type = store
            .store(UploadKind::PaymentScreenshot, "proof.pdf", b"123")
            .await;
        assert!(matches!(wrong_type, Err(AppError::Validation(_))));

        let no_extension = store
            .store(UploadKind::AssignmentAttachment, "README", b"123")
            .await;
        assert!(matches!(no_extension, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let store = temp_store(1024);
        assert!(store.resolve("/uploads/payments/1-a.png").is_some());
        assert!(store.resolve("/uploads/../secret").is_none());
        assert!(store.resolve("/elsewhere/a.png").is_none());
    }
}

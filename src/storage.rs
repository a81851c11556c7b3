use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;

/// Extensions accepted by the image upload endpoint, lower-case.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Every stored file is served from under this path.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("허용되지 않는 파일 형식입니다. (jpg, jpeg, png, gif, webp)")]
    UnsupportedType,
    #[error("파일 크기는 {0}MB를 넘을 수 없습니다.")]
    TooLarge(usize),
    #[error("잘못된 파일 이름입니다.")]
    InvalidKey,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType
            | StorageError::TooLarge(_)
            | StorageError::InvalidKey => AppError::InvalidRequest(err.to_string()),
            StorageError::Io(_) | StorageError::Unavailable(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

/// StorageService
///
/// Where uploaded images end up. Handlers only hand over a key and the bytes and get
/// back the public URL; the disk layout stays behind the trait.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Prepares the backing location (creates the upload directory). Called at startup.
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Writes `bytes` under `key` and returns the URL the file is served from.
    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

/// LocalDiskStorage
///
/// Writes files into one directory, which the router also serves under `/uploads`.
#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err(StorageError::InvalidKey);
        }

        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(format!("{PUBLIC_PREFIX}/{key}"))
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// key so it can never escape the storage root.
pub fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Lower-cased extension of an uploaded file name, if it is an allowed image type.
pub fn image_extension(filename: &str) -> Result<String, StorageError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(StorageError::UnsupportedType)?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(StorageError::UnsupportedType)
    }
}

/// Fresh collision-free object name: `<uuid>.<ext>`.
pub fn object_key(ext: &str) -> String {
    format!("{}.{ext}", Uuid::new_v4())
}

/// MockStorageService
///
/// Test double that keeps stored keys in memory and can simulate an unavailable backend.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    stored: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// `(key, size)` of every successful `store` call, in call order.
    pub async fn stored(&self) -> Vec<(String, usize)> {
        self.stored.lock().await.clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "mock storage: simulation requested".to_string(),
            ));
        }
        let key = sanitize_key(key);
        self.stored.lock().await.push((key.clone(), bytes.len()));
        Ok(format!("{PUBLIC_PREFIX}/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("./a//b.png"), "a/b.png");
        assert_eq!(sanitize_key("..\\..\\win.ini"), "win.ini");
        assert_eq!(sanitize_key(".."), "");
    }

    #[test]
    fn extension_rules() {
        assert_eq!(image_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("banner.webp").unwrap(), "webp");
        assert!(image_extension("script.php").is_err());
        assert!(image_extension("noext").is_err());
        assert!(image_extension("archive.png.exe").is_err());
    }

    #[test]
    fn object_keys_are_unique() {
        let a = object_key("png");
        assert!(a.ends_with(".png"));
        assert_ne!(a, object_key("png"));
    }
}

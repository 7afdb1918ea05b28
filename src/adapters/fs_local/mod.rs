// Local filesystem adapter - Working directory and artifact management

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Clone, Default)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    async fn ensure_dir(&self, path: &Path) -> Result<(), DomainError> {
        fs::create_dir_all(path).await.map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })
    }

    async fn remove_file(&self, path: &Path) -> Result<(), DomainError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::FsFail(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dir_and_file_lifecycle() {
        let temp = TempDir::new().unwrap();
        let fs_port = LocalFsAdapter::new();

        let nested = temp.path().join("work").join("run");
        fs_port.ensure_dir(&nested).await.unwrap();
        assert!(fs_port.exists(&nested).await);

        let file = nested.join("clip0.resized.mp4");
        std::fs::write(&file, b"data").unwrap();
        fs_port.remove_file(&file).await.unwrap();
        assert!(!fs_port.exists(&file).await);

        // second removal is a no-op
        fs_port.remove_file(&file).await.unwrap();
    }
}

//! Local filesystem store for uploaded search images.
//!
//! The provider fetches images by URL, so uploads are persisted under a
//! public directory and handed back as `/uploads/<name>` links. Storage
//! failures are fatal to the request (`Upload`).

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::pipeline::SearchError;

#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    public_base_url: String,
}

impl ImageStore {
    pub fn from_env() -> Result<Self, SearchError> {
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map_err(|_| SearchError::Configuration("UPLOAD_DIR is not set".to_string()))?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .map_err(|_| SearchError::Configuration("PUBLIC_BASE_URL is not set".to_string()))?;
        Ok(Self::new(PathBuf::from(upload_dir), &public_base_url))
    }

    pub fn new(upload_dir: PathBuf, public_base_url: &str) -> Self {
        Self {
            upload_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Writes the image under a unique name and returns its fetchable URL.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, SearchError> {
        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(upload_err)?;
        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize(original_name));
        fs::write(self.upload_dir.join(&file_name), bytes)
            .await
            .map_err(upload_err)?;
        Ok(format!("{}/uploads/{}", self.public_base_url, file_name))
    }

    /// Removes a stored image; true when the file existed and was deleted.
    pub async fn delete(&self, file_name: &str) -> bool {
        fs::remove_file(self.upload_dir.join(sanitize(file_name)))
            .await
            .is_ok()
    }
}

fn upload_err(err: std::io::Error) -> SearchError {
    SearchError::Upload(err.to_string())
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize(name: &str) -> String {
    let trimmed = name.trim();
    let component = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);
    if component.is_empty() {
        "upload".to_string()
    } else {
        component.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        let dir = std::env::temp_dir().join(format!("marketlens-store-{}", Uuid::new_v4()));
        ImageStore::new(dir, "http://localhost:8000/")
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_public_url() {
        let store = temp_store();
        let url = store.store("cat.jpg", b"not really a jpeg").await.unwrap();
        assert!(url.starts_with("http://localhost:8000/uploads/"));
        assert!(url.ends_with("_cat.jpg"));

        let file_name = url.rsplit('/').next().unwrap();
        let on_disk = store.upload_dir().join(file_name);
        assert_eq!(fs::read(&on_disk).await.unwrap(), b"not really a jpeg");
    }

    #[tokio::test]
    async fn stored_names_ignore_client_directories() {
        let store = temp_store();
        let url = store.store("../../etc/passwd", b"x").await.unwrap();
        assert!(url.ends_with("_passwd"));
    }

    #[tokio::test]
    async fn delete_reports_whether_the_file_existed() {
        let store = temp_store();
        let url = store.store("cat.jpg", b"bytes").await.unwrap();
        let file_name = url.rsplit('/').next().unwrap();
        assert!(store.delete(file_name).await);
        assert!(!store.delete(file_name).await);
    }
}

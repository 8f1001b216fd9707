use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// 10 MB upload limit for images
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Sub-directory for profile pictures.
pub const PROFILE_PICS: &str = "profile_pics";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// On-disk storage for uploaded images.
///
/// Files live at `{dir}/{name}` (post images) or `{dir}/profile_pics/{name}`.
/// Stored names are `{uuid}_{original}` so two uploads with the same
/// original name never overwrite each other. The value stored in the DB is
/// the path relative to `dir`, which is also the path under `/static/uploads`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(dir.join(PROFILE_PICS)).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an image and return its relative path.
    pub async fn save(&self, subdir: Option<&str>, stored_name: &str, data: &[u8]) -> Result<String> {
        let relative = match subdir {
            Some(sub) => format!("{sub}/{stored_name}"),
            None => stored_name.to_string(),
        };

        let path = self.dir.join(&relative);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Stored upload {} ({} bytes)", relative, data.len());
        Ok(relative)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<()> {
        let path = self.dir.join(relative);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted upload {}", relative);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", relative);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a just-saved upload when the write that should reference it
    /// failed, then hand the result back unchanged.
    pub async fn discard_on_error<T>(
        &self,
        stored: Option<&str>,
        result: Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        if let (Err(_), Some(relative)) = (&result, stored) {
            if let Err(e) = self.delete(relative).await {
                warn!("Failed to remove orphaned upload {}: {}", relative, e);
            }
        }
        result
    }
}

/// Check an uploaded image and derive the name it will be stored under.
pub fn stored_image_name(original: &str, size: usize) -> Result<String, ApiError> {
    if size > MAX_IMAGE_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let name = sanitize_file_name(original)
        .ok_or_else(|| ApiError::bad_request("Invalid file name."))?;

    let allowed = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if !allowed {
        return Err(ApiError::bad_request(
            "Only png, jpg, jpeg, gif and webp images are allowed.",
        ));
    }

    Ok(format!("{}_{}", Uuid::new_v4().simple(), name))
}

/// Reduce a client-supplied file name to a single safe path component.
pub fn sanitize_file_name(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

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
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("C:\\pics\\cat.png").as_deref(), Some("cat.png"));
        assert_eq!(sanitize_file_name("my photo.jpg").as_deref(), Some("my_photo.jpg"));
        assert_eq!(sanitize_file_name(".hidden.png").as_deref(), Some("hidden.png"));
        assert_eq!(sanitize_file_name("..."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn only_images_are_accepted() {
        let name = stored_image_name("cat.PNG", 10).unwrap();
        assert!(name.ends_with("_cat.PNG"));
        assert_ne!(name, stored_image_name("cat.PNG", 10).unwrap());

        assert!(matches!(
            stored_image_name("script.sh", 10),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            stored_image_name("big.png", MAX_IMAGE_SIZE + 1),
            Err(ApiError::PayloadTooLarge)
        ));
    }

    #[tokio::test]
    async fn save_and_delete() {
        let dir = std::env::temp_dir().join(format!("misfits_storage_test_{}", Uuid::new_v4()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        let rel = storage.save(Some(PROFILE_PICS), "a.png", b"img").await.unwrap();
        assert_eq!(rel, "profile_pics/a.png");
        assert_eq!(tokio::fs::read(dir.join(&rel)).await.unwrap(), b"img");

        storage.delete(&rel).await.unwrap();
        assert!(!dir.join(&rel).exists());
        // second delete is a no-op
        storage.delete(&rel).await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_write_discards_the_upload() {
        let dir = std::env::temp_dir().join(format!("misfits_storage_test_{}", Uuid::new_v4()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        let kept = storage.save(None, "kept.png", b"img").await.unwrap();
        let ok = storage.discard_on_error(Some(kept.as_str()), Ok::<_, ApiError>(1)).await;
        assert!(matches!(ok, Ok(1)));
        assert!(dir.join(&kept).exists());

        let orphan = storage.save(None, "orphan.png", b"img").await.unwrap();
        let failed = storage
            .discard_on_error(Some(orphan.as_str()), Err::<(), _>(ApiError::Internal))
            .await;
        assert!(matches!(failed, Err(ApiError::Internal)));
        assert!(!dir.join(&orphan).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}

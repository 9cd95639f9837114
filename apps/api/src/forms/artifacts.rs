//! Artifact lifecycle coordinator — ties the resume file's existence to the
//! record's existence: attach on create, replace-and-orphan-delete on update,
//! best-effort delete on record removal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

pub const RESUME_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded resume, as handed over by the multipart layer.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Storage backend for resume artifacts. Returns a stable opaque location
/// string on store; deletes by that same string.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(&self, upload: &ResumeUpload) -> Result<String, AppError>;
    async fn remove(&self, location: &str) -> Result<(), AppError>;
}

/// Local-disk artifact store rooted at the configured upload directory.
pub struct DiskArtifactStore {
    root: PathBuf,
}

impl DiskArtifactStore {
    /// Creates the store, ensuring the upload directory exists.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::Storage(format!("create upload dir {root:?}: {e}")))?;
        Ok(DiskArtifactStore { root })
    }
}

#[async_trait]
impl ArtifactStore for DiskArtifactStore {
    async fn store(&self, upload: &ResumeUpload) -> Result<String, AppError> {
        check_constraints(upload)?;

        let name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&upload.filename));
        let path = self.root.join(name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| AppError::Storage(format!("write artifact {path:?}: {e}")))?;

        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, location: &str) -> Result<(), AppError> {
        tokio::fs::remove_file(Path::new(location))
            .await
            .map_err(|e| AppError::Storage(format!("remove artifact {location}: {e}")))
    }
}

/// Content-type and size bounds, checked before anything touches disk.
fn check_constraints(upload: &ResumeUpload) -> Result<(), AppError> {
    if upload.content_type != RESUME_CONTENT_TYPE {
        return Err(AppError::ArtifactRejected(format!(
            "Only PDF files are allowed (got {})",
            upload.content_type
        )));
    }
    if upload.bytes.len() > MAX_RESUME_BYTES {
        return Err(AppError::ArtifactRejected(format!(
            "Resume exceeds the {} MiB limit",
            MAX_RESUME_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn sanitize_filename(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "resume.pdf".to_string()
    } else {
        name
    }
}

/// Outcome of best-effort artifact cleanup during record deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCleanup {
    Removed,
    Failed,
}

/// Create path: the artifact is mandatory. Its absence is a validation
/// error, not a storage error.
pub async fn attach_on_create(
    store: &dyn ArtifactStore,
    upload: Option<&ResumeUpload>,
) -> Result<String, AppError> {
    let upload = upload
        .ok_or_else(|| AppError::validation("employment.resume", "Resume file is required"))?;
    store.store(upload).await
}

/// Update path: a new upload becomes the new reference and the replaced
/// artifact is deleted best-effort. No upload means no change.
pub async fn replace_on_update(
    store: &dyn ArtifactStore,
    prior: Option<&str>,
    upload: Option<&ResumeUpload>,
) -> Result<Option<String>, AppError> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let reference = store.store(upload).await?;
    if let Some(prior) = prior {
        if let Err(e) = store.remove(prior).await {
            warn!("Failed to delete replaced resume {prior}: {e}");
        } else {
            info!("Deleted replaced resume {prior}");
        }
    }
    Ok(Some(reference))
}

/// Delete path: the record is already gone; removing the artifact must not
/// fail the operation. The degraded case is reported, not swallowed.
pub async fn release_on_delete(
    store: &dyn ArtifactStore,
    reference: Option<&str>,
) -> ArtifactCleanup {
    let Some(reference) = reference else {
        return ArtifactCleanup::Removed;
    };
    match store.remove(reference).await {
        Ok(()) => ArtifactCleanup::Removed,
        Err(e) => {
            warn!("Failed to delete resume {reference}: {e}");
            ArtifactCleanup::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn pdf_upload() -> ResumeUpload {
        ResumeUpload {
            filename: "resume.pdf".to_string(),
            content_type: RESUME_CONTENT_TYPE.to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 fake"),
        }
    }

    async fn disk_store() -> (TempDir, DiskArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = DiskArtifactStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_location() {
        let (_dir, store) = disk_store().await;
        let location = store.store(&pdf_upload()).await.unwrap();
        assert!(location.ends_with("resume.pdf"));
        assert!(Path::new(&location).exists());
    }

    #[tokio::test]
    async fn non_pdf_content_type_rejected() {
        let (_dir, store) = disk_store().await;
        let upload = ResumeUpload {
            content_type: "image/png".to_string(),
            ..pdf_upload()
        };
        let err = store.store(&upload).await.unwrap_err();
        assert!(matches!(err, AppError::ArtifactRejected(_)));
    }

    #[tokio::test]
    async fn oversized_upload_rejected_before_write() {
        let (dir, store) = disk_store().await;
        let upload = ResumeUpload {
            bytes: Bytes::from(vec![0u8; MAX_RESUME_BYTES + 1]),
            ..pdf_upload()
        };
        let err = store.store(&upload).await.unwrap_err();
        assert!(matches!(err, AppError::ArtifactRejected(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn attach_on_create_requires_upload() {
        let (_dir, store) = disk_store().await;
        let err = attach_on_create(&store, None).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.0[0].field, "employment.resume");
        assert_eq!(errors.0[0].message, "Resume file is required");
    }

    #[tokio::test]
    async fn replace_deletes_prior_artifact() {
        let (_dir, store) = disk_store().await;
        let old = store.store(&pdf_upload()).await.unwrap();
        let new = replace_on_update(&store, Some(&old), Some(&pdf_upload()))
            .await
            .unwrap()
            .expect("new reference");
        assert_ne!(new, old);
        assert!(Path::new(&new).exists());
        assert!(!Path::new(&old).exists());
    }

    #[tokio::test]
    async fn replace_without_upload_keeps_prior() {
        let (_dir, store) = disk_store().await;
        let old = store.store(&pdf_upload()).await.unwrap();
        let result = replace_on_update(&store, Some(&old), None).await.unwrap();
        assert!(result.is_none());
        assert!(Path::new(&old).exists());
    }

    #[tokio::test]
    async fn release_reports_removal() {
        let (_dir, store) = disk_store().await;
        let location = store.store(&pdf_upload()).await.unwrap();
        let outcome = release_on_delete(&store, Some(&location)).await;
        assert_eq!(outcome, ArtifactCleanup::Removed);
        assert!(!Path::new(&location).exists());
    }

    #[tokio::test]
    async fn release_reports_degraded_cleanup() {
        let (_dir, store) = disk_store().await;
        let outcome = release_on_delete(&store, Some("does/not/exist.pdf")).await;
        assert_eq!(outcome, ArtifactCleanup::Failed);
    }

    #[tokio::test]
    async fn filenames_are_sanitized() {
        let (_dir, store) = disk_store().await;
        let upload = ResumeUpload {
            filename: "../../etc/pass wd.pdf".to_string(),
            ..pdf_upload()
        };
        let location = store.store(&upload).await.unwrap();
        assert!(location.ends_with(".._.._etc_pass_wd.pdf"));
        assert!(Path::new(&location).exists());
    }
}

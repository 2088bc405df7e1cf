//! Upload lifecycle: file reception, orphan cleanup, and stale-asset reaping.
//!
//! Files arrive as multipart parts, get validated and written to the upload
//! directory before any database work, and are referenced from rows as
//! `/uploads/<name>` URLs. The lifecycle guarantees:
//!
//! - a rejected file (bad MIME type, too large) never stays on disk;
//! - a file whose owning database write fails is removed before the response
//!   is sent, on every failure path, via the [`PendingUpload`] guard;
//! - a file superseded by a successful write is removed only after that
//!   write has committed ([`UploadStore::remove_stale`]), and shared default
//!   assets are never removed.

use crate::errors::{Error, Result};
use axum::extract::multipart::Field;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared placeholder shown for users who never uploaded an avatar.
pub const DEFAULT_AVATAR: &str = "default_avatar.png";

/// Shared placeholder for observations without a photo.
pub const DEFAULT_PHOTO: &str = "default_photo.png";

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_IMAGE_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

/// Whether an asset reference points at a shared default that cleanup must
/// never touch.
pub fn is_default_asset(reference: &str) -> bool {
    reference == DEFAULT_AVATAR || reference == DEFAULT_PHOTO
}

/// Handle to the upload directory, shared across handlers via `AppState`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    /// Open the store, creating the upload directory if needed.
    pub async fn init(dir: impl Into<PathBuf>, max_bytes: u64) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Receive one multipart file part.
    ///
    /// The MIME type is checked before anything touches disk; the size limit
    /// is enforced incrementally while streaming so an oversized upload is
    /// aborted (and its partial file removed) as soon as the limit is
    /// crossed, not after the client finishes sending.
    pub async fn receive(&self, mut field: Field<'_>) -> Result<PendingUpload> {
        self.check_content_type(field.content_type())?;

        let name = unique_name(field.file_name());
        let path = self.dir.join(&name);

        let mut file = fs::File::create(&path).await.map_err(|e| Error::Internal {
            operation: format!("create upload file: {e}"),
        })?;

        let mut written = 0u64;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    remove_partial(&path).await;
                    return Err(Error::BadRequest {
                        message: format!("Failed to read file chunk: {e}"),
                    });
                }
            };

            written += chunk.len() as u64;
            if written > self.max_bytes {
                drop(file);
                remove_partial(&path).await;
                return Err(Error::UploadRejected {
                    message: "File size exceeds maximum limit".to_string(),
                });
            }

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                remove_partial(&path).await;
                return Err(Error::Internal {
                    operation: format!("write upload file: {e}"),
                });
            }
        }

        if let Err(e) = file.sync_all().await {
            drop(file);
            remove_partial(&path).await;
            return Err(Error::Internal {
                operation: format!("sync upload file: {e}"),
            });
        }

        debug!(name = %name, bytes = written, "stored upload");
        Ok(PendingUpload {
            path,
            url: format!("{PUBLIC_PREFIX}/{name}"),
            size: written,
            committed: false,
        })
    }

    /// Write a complete buffer into the store.
    ///
    /// Same validation as [`receive`](Self::receive), without the multipart
    /// streaming; used by fixtures and tests.
    pub async fn store_bytes(&self, original_name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> Result<PendingUpload> {
        self.check_content_type(content_type)?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(Error::UploadRejected {
                message: "File size exceeds maximum limit".to_string(),
            });
        }

        let name = unique_name(original_name);
        let path = self.dir.join(&name);
        fs::write(&path, bytes).await.map_err(|e| Error::Internal {
            operation: format!("write upload file: {e}"),
        })?;

        Ok(PendingUpload {
            path,
            url: format!("{PUBLIC_PREFIX}/{name}"),
            size: bytes.len() as u64,
            committed: false,
        })
    }

    /// Stale-asset reaper: remove a superseded file.
    ///
    /// Only called after the database write that replaced the reference has
    /// committed. Shared defaults are skipped, a missing file is a no-op,
    /// and removal failures are logged rather than surfaced - the row update
    /// already succeeded, so the response must not fail over cleanup.
    pub async fn remove_stale(&self, reference: &str) {
        if is_default_asset(reference) {
            return;
        }
        let Some(path) = self.resolve(reference) else {
            warn!(reference, "stale asset reference does not point into the upload directory, skipping");
            return;
        };

        if !path.exists() {
            return;
        }
        match fs::remove_file(&path).await {
            Ok(()) => debug!(reference, "removed superseded upload"),
            Err(e) => warn!(reference, "failed to remove superseded upload: {e}"),
        }
    }

    fn check_content_type(&self, content_type: Option<&str>) -> Result<()> {
        match content_type {
            Some(ct) if ALLOWED_IMAGE_TYPES.contains(&ct) => Ok(()),
            _ => Err(Error::UploadRejected {
                message: "Only image files are allowed (jpeg, jpg, png, gif, webp)".to_string(),
            }),
        }
    }

    /// Map an asset reference back to a path inside the upload directory.
    /// Anything that is not a bare `/uploads/<name>` reference is refused.
    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let name = reference.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.dir.join(name))
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!("failed to remove partial upload {}: {e}", path.display());
    }
}

/// A stored file that no database row references yet.
///
/// The guard owns the file until the write that references it commits:
/// dropping the guard removes the file, so every early return out of a
/// handler (validation failure, constraint violation, connection error,
/// cancellation) cleans up without per-branch bookkeeping. The success path
/// calls [`commit`](Self::commit), which disarms the cleanup and yields the
/// URL that was durably stored.
#[derive(Debug)]
pub struct PendingUpload {
    path: PathBuf,
    url: String,
    size: u64,
    committed: bool,
}

impl PendingUpload {
    /// The `/uploads/<name>` reference this file will be stored under.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the cleanup once the referencing write has committed.
    pub fn commit(mut self) -> String {
        self.committed = true;
        self.url.clone()
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Existence check first: the file may already be gone if reception
        // itself failed partway.
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("failed to remove pending upload {}: {e}", self.path.display());
            } else {
                debug!("removed pending upload {}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store(max_bytes: u64) -> (tempfile::TempDir, UploadStore) {
        let dir = tempdir().unwrap();
        let store = UploadStore::init(dir.path(), max_bytes).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_store_and_commit_keeps_file() {
        let (_dir, store) = test_store(1024).await;

        let pending = store.store_bytes(Some("summit.jpg"), Some("image/jpeg"), b"fake-jpeg").await.unwrap();
        let path = pending.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(pending.size(), 9);
        assert!(pending.url().starts_with("/uploads/summit-"));
        assert!(pending.url().ends_with(".jpg"));

        let url = pending.commit();
        assert!(path.exists(), "committed upload must survive the guard");
        assert!(url.starts_with("/uploads/"));
    }

    #[tokio::test]
    async fn test_drop_without_commit_removes_file() {
        let (_dir, store) = test_store(1024).await;

        let pending = store.store_bytes(Some("summit.jpg"), Some("image/jpeg"), b"fake-jpeg").await.unwrap();
        let path = pending.path().to_path_buf();
        assert!(path.exists());

        drop(pending);
        assert!(!path.exists(), "uncommitted upload must be removed on drop");
    }

    #[tokio::test]
    async fn test_rejects_disallowed_content_type() {
        let (dir, store) = test_store(1024).await;

        let err = store.store_bytes(Some("notes.txt"), Some("text/plain"), b"hello").await.unwrap_err();
        assert!(matches!(err, Error::UploadRejected { .. }));

        let missing = store.store_bytes(Some("notes.bin"), None, b"hello").await.unwrap_err();
        assert!(matches!(missing, Error::UploadRejected { .. }));

        // Nothing may be left behind for rejected uploads.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload_without_leaving_file() {
        let (dir, store) = test_store(8).await;

        let err = store
            .store_bytes(Some("big.png"), Some("image/png"), &[0u8; 64])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadRejected { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unique_names_never_collide() {
        let (_dir, store) = test_store(1024).await;

        let a = store.store_bytes(Some("trail.png"), Some("image/png"), b"a").await.unwrap();
        let b = store.store_bytes(Some("trail.png"), Some("image/png"), b"b").await.unwrap();
        assert_ne!(a.url(), b.url());

        a.commit();
        b.commit();
    }

    #[test]
    fn test_unique_name_sanitizes_client_input() {
        let name = unique_name(Some("../../etc/passwd"));
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));

        let name = unique_name(Some("my photo (1).jpeg"));
        assert!(name.ends_with(".jpeg"));
        assert!(!name.contains(' '));

        let name = unique_name(None);
        assert!(name.starts_with("upload-"));
    }

    #[tokio::test]
    async fn test_remove_stale_deletes_referenced_file() {
        let (_dir, store) = test_store(1024).await;

        let url = store
            .store_bytes(Some("old.jpg"), Some("image/jpeg"), b"old")
            .await
            .unwrap()
            .commit();
        let path = store.dir().join(url.strip_prefix("/uploads/").unwrap());
        assert!(path.exists());

        store.remove_stale(&url).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_stale_never_touches_defaults() {
        let (_dir, store) = test_store(1024).await;

        // Defaults live outside the store; the call must be a silent no-op
        // no matter how often a "replacement" happens.
        store.remove_stale(DEFAULT_AVATAR).await;
        store.remove_stale(DEFAULT_PHOTO).await;
    }

    #[tokio::test]
    async fn test_remove_stale_is_idempotent_and_ignores_foreign_paths() {
        let (_dir, store) = test_store(1024).await;

        // Already absent: no error, no panic.
        store.remove_stale("/uploads/never-existed.jpg").await;

        // References outside the upload directory are refused outright.
        store.remove_stale("/etc/passwd").await;
        store.remove_stale("/uploads/../secrets.txt").await;
        store.remove_stale("/uploads/nested/file.jpg").await;
    }
}

/// Collision-free file name: the sanitized original stem, a random suffix,
/// and the original extension.
fn unique_name(original: Option<&str>) -> String {
    let original = original.unwrap_or("upload");
    // Strip any client-supplied directory components.
    let base = Path::new(original).file_name().and_then(|n| n.to_str()).unwrap_or("upload");
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "upload".to_string() } else { stem };

    let suffix = Uuid::new_v4();
    match ext {
        Some(ext) => format!("{stem}-{suffix}.{ext}"),
        None => format!("{stem}-{suffix}"),
    }
}

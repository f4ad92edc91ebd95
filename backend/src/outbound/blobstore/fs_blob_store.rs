//! Filesystem-backed `BlobStore` over a capability-scoped directory.
//!
//! The media root is opened once at startup as a `cap_std::fs::Dir`, so
//! every subsequent read or write is confined to that directory regardless
//! of what a handle string contains. Writes run on the blocking pool.
//!
//! `url_for` joins the configured public base URL, which must itself be
//! absolute: handles are storage-relative, and rendering them relative
//! would make image links resolve against the application host instead of
//! the storage host.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use uuid::Uuid;

use crate::domain::ports::{BlobHandle, BlobStore, ImageBlob, StorageError};

/// Blob store writing objects into a single capability-scoped directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: Arc<Dir>,
    public_base_url: String,
}

impl FsBlobStore {
    /// Open (creating if necessary) the media root and validate the public
    /// base URL.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or opened, or when
    /// `public_base_url` is not absolute.
    pub fn open(media_root: &Path, public_base_url: &str) -> Result<Self, StorageError> {
        let base = public_base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(StorageError::io(format!(
                "public base URL must be absolute (http or https), got {public_base_url}"
            )));
        }

        Dir::create_ambient_dir_all(media_root, ambient_authority()).map_err(|err| {
            StorageError::io(format!(
                "create media root {}: {err}",
                media_root.display()
            ))
        })?;
        let root = Dir::open_ambient_dir(media_root, ambient_authority()).map_err(|err| {
            StorageError::io(format!("open media root {}: {err}", media_root.display()))
        })?;

        Ok(Self {
            root: Arc::new(root),
            public_base_url: base.to_owned(),
        })
    }

    /// Collapse a client-suggested name into a safe single path segment.
    fn sanitize(name: &str) -> String {
        let cleaned: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let trimmed = cleaned.trim_matches(|c| matches!(c, '-' | '.'));
        if trimmed.is_empty() {
            "upload".to_owned()
        } else {
            trimmed.to_owned()
        }
    }

    fn handle_for(file_name: &str) -> String {
        format!("{}-{}", Uuid::new_v4().simple(), Self::sanitize(file_name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, blob: &ImageBlob) -> Result<BlobHandle, StorageError> {
        let handle = Self::handle_for(&blob.file_name);
        let root = Arc::clone(&self.root);
        let bytes = blob.bytes.clone();
        let name = handle.clone();

        tokio::task::spawn_blocking(move || root.write(Path::new(&name), &bytes))
            .await
            .map_err(|err| StorageError::io(format!("blocking write task failed: {err}")))?
            .map_err(|err| StorageError::io(format!("write {handle}: {err}")))?;

        Ok(BlobHandle::new(handle))
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<(), StorageError> {
        let root = Arc::clone(&self.root);
        let name = handle.as_str().to_owned();

        let result = tokio::task::spawn_blocking(move || root.remove_file(Path::new(&name)))
            .await
            .map_err(|err| StorageError::io(format!("blocking delete task failed: {err}")))?;

        match result {
            Ok(()) => Ok(()),
            // An already-absent blob counts as deleted.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(format!(
                "remove {}: {err}",
                handle.as_str()
            ))),
        }
    }

    fn url_for(&self, handle: &BlobHandle) -> String {
        format!("{}/{}", self.public_base_url, handle.as_str())
    }
}

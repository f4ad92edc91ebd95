//! Listing domain service orchestrating repository, blob store, and search.
//!
//! This is the only component that touches all three collaborators, and
//! therefore the place where partial-failure semantics live: the listing row
//! is the durable primary record, while gallery uploads are best-effort
//! attachments that may individually fail without aborting the request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::json;
use tracing::warn;

use crate::domain::error::Error;
use crate::domain::listing::{Listing, ListingId, ListingValidationError, PropertyType};
use crate::domain::ports::{
    BlobHandle, BlobStore, CreateListingRequest, GalleryWarning, ImageBlob, ListingCommands,
    ListingDetail, ListingMutationOutcome, ListingQueries, ListingRepository,
    ListingRepositoryError, UpdateListingRequest,
};
use crate::domain::search::SearchFilter;
use crate::domain::user::UserId;

/// Upper bound on gallery images accepted in a single request.
pub const MAX_GALLERY_IMAGES: usize = 12;
/// Upper bound on a single uploaded image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

fn map_repository_error(error: ListingRepositoryError) -> Error {
    match error {
        ListingRepositoryError::NotFound => Error::not_found("listing not found"),
        ListingRepositoryError::Forbidden => {
            Error::forbidden("only the owner may modify this listing")
        }
        ListingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("listing repository unavailable: {message}"))
        }
        ListingRepositoryError::Query { message } => {
            Error::internal(format!("listing repository error: {message}"))
        }
    }
}

fn map_validation_error(error: ListingValidationError) -> Error {
    Error::invalid_request("listing fields failed validation").with_details(error.to_details())
}

fn check_gallery_bounds(cover: Option<&ImageBlob>, images: &[ImageBlob]) -> Result<(), Error> {
    if images.len() > MAX_GALLERY_IMAGES {
        return Err(Error::invalid_request(format!(
            "at most {MAX_GALLERY_IMAGES} gallery images may be uploaded per request"
        ))
        .with_details(json!({ "field": "images", "code": "too_many_images" })));
    }
    for blob in cover.into_iter().chain(images) {
        if blob.bytes.is_empty() {
            return Err(Error::invalid_request(format!(
                "image {} is empty",
                blob.file_name
            ))
            .with_details(json!({
                "field": "images",
                "code": "empty_image",
                "value": blob.file_name.as_str(),
            })));
        }
        if blob.bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::invalid_request(format!(
                "image {} exceeds the {MAX_IMAGE_BYTES} byte limit",
                blob.file_name
            ))
            .with_details(json!({
                "field": "images",
                "code": "image_too_large",
                "value": blob.file_name.as_str(),
            })));
        }
    }
    Ok(())
}

/// Listing use-case service implementing the command and query driving ports
/// over a repository and a blob store.
///
/// Uploads within one request fan out concurrently under a bounded per-upload
/// deadline; results are collected in submission order so the final gallery
/// state is deterministic regardless of completion order.
#[derive(Clone)]
pub struct ListingService<R, B> {
    repository: Arc<R>,
    blob_store: Arc<B>,
    upload_timeout: Duration,
}

impl<R, B> ListingService<R, B> {
    /// Create a service with the default per-upload deadline.
    pub fn new(repository: Arc<R>, blob_store: Arc<B>) -> Self {
        Self {
            repository,
            blob_store,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Override the per-upload deadline.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }
}

impl<R, B> ListingService<R, B>
where
    R: ListingRepository,
    B: BlobStore,
{
    /// Upload one blob under the deadline, flattening every failure mode
    /// into a reportable warning.
    async fn upload_blob(&self, blob: &ImageBlob) -> Result<BlobHandle, GalleryWarning> {
        match tokio::time::timeout(self.upload_timeout, self.blob_store.put(blob)).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(error)) => Err(GalleryWarning {
                file_name: blob.file_name.clone(),
                reason: error.to_string(),
            }),
            Err(_) => Err(GalleryWarning {
                file_name: blob.file_name.clone(),
                reason: format!(
                    "upload timed out after {}s",
                    self.upload_timeout.as_secs()
                ),
            }),
        }
    }

    /// Fan the gallery uploads out concurrently, collecting handles and
    /// warnings in submission order.
    async fn upload_gallery(
        &self,
        images: &[ImageBlob],
    ) -> (Vec<BlobHandle>, Vec<GalleryWarning>) {
        let results = join_all(images.iter().map(|blob| self.upload_blob(blob))).await;
        let mut handles = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(handle) => handles.push(handle),
                Err(warning) => {
                    warn!(
                        file = %warning.file_name,
                        reason = %warning.reason,
                        "gallery upload skipped"
                    );
                    warnings.push(warning);
                }
            }
        }
        (handles, warnings)
    }

    async fn upload_cover(
        &self,
        cover: Option<&ImageBlob>,
    ) -> (Option<BlobHandle>, Option<GalleryWarning>) {
        match cover {
            None => (None, None),
            Some(blob) => match self.upload_blob(blob).await {
                Ok(handle) => (Some(handle), None),
                Err(warning) => {
                    warn!(
                        file = %warning.file_name,
                        reason = %warning.reason,
                        "cover upload skipped"
                    );
                    (None, Some(warning))
                }
            },
        }
    }

    /// Best-effort blob removal; failures are logged, never surfaced.
    async fn discard_blobs(&self, handles: &[BlobHandle]) {
        for handle in handles {
            if let Err(error) = self.blob_store.delete(handle).await {
                warn!(handle = %handle, error = %error, "blob cleanup failed");
            }
        }
    }
}

#[async_trait]
impl<R, B> ListingCommands for ListingService<R, B>
where
    R: ListingRepository,
    B: BlobStore,
{
    async fn create_listing(
        &self,
        actor: &UserId,
        request: CreateListingRequest,
    ) -> Result<ListingMutationOutcome, Error> {
        request.draft.validate().map_err(map_validation_error)?;
        check_gallery_bounds(request.cover_image.as_ref(), &request.images)?;

        let mut warnings = Vec::new();
        let (cover_handle, cover_warning) =
            self.upload_cover(request.cover_image.as_ref()).await;
        warnings.extend(cover_warning);

        let listing = match self
            .repository
            .create(actor, &request.draft, cover_handle.as_ref())
            .await
        {
            Ok(listing) => listing,
            Err(error) => {
                if let Some(handle) = cover_handle {
                    self.discard_blobs(std::slice::from_ref(&handle)).await;
                }
                return Err(map_repository_error(error));
            }
        };

        let (handles, gallery_warnings) = self.upload_gallery(&request.images).await;
        warnings.extend(gallery_warnings);

        let images = if handles.is_empty() {
            Vec::new()
        } else {
            self.repository
                .add_images(listing.id(), actor, &handles)
                .await
                .map_err(map_repository_error)?
        };

        Ok(ListingMutationOutcome {
            listing,
            images,
            warnings,
        })
    }

    async fn update_listing(
        &self,
        actor: &UserId,
        id: ListingId,
        request: UpdateListingRequest,
    ) -> Result<ListingMutationOutcome, Error> {
        request.changes.validate().map_err(map_validation_error)?;
        check_gallery_bounds(request.cover_image.as_ref(), &request.new_images)?;

        let mut warnings = Vec::new();
        let mut changes = request.changes;

        let (cover_handle, cover_warning) =
            self.upload_cover(request.cover_image.as_ref()).await;
        warnings.extend(cover_warning);

        // Remember the cover being replaced so its blob can be cleaned up
        // once the row update has gone through.
        let previous_cover = if cover_handle.is_some() {
            self.repository
                .find_by_id(id)
                .await
                .map_err(map_repository_error)?
                .and_then(|listing| listing.cover_image().cloned())
        } else {
            None
        };
        if let Some(handle) = &cover_handle {
            changes.cover_image = Some(handle.clone());
        }

        // Order of operations: field update, then additions, then deletions,
        // so a request that both adds and removes images leaves a
        // deterministic final gallery.
        let listing = match self.repository.update(id, actor, &changes).await {
            Ok(listing) => listing,
            Err(error) => {
                if let Some(handle) = cover_handle {
                    self.discard_blobs(std::slice::from_ref(&handle)).await;
                }
                return Err(map_repository_error(error));
            }
        };
        if let Some(old) = previous_cover {
            self.discard_blobs(std::slice::from_ref(&old)).await;
        }

        let (handles, gallery_warnings) = self.upload_gallery(&request.new_images).await;
        warnings.extend(gallery_warnings);
        if !handles.is_empty() {
            self.repository
                .add_images(id, actor, &handles)
                .await
                .map_err(map_repository_error)?;
        }

        if !request.delete_image_ids.is_empty() {
            let removed = self
                .repository
                .remove_images(id, actor, &request.delete_image_ids)
                .await
                .map_err(map_repository_error)?;
            self.discard_blobs(&removed).await;
        }

        let images = self
            .repository
            .list_images(id)
            .await
            .map_err(map_repository_error)?;

        Ok(ListingMutationOutcome {
            listing,
            images,
            warnings,
        })
    }

    async fn delete_listing(&self, actor: &UserId, id: ListingId) -> Result<(), Error> {
        let removed = self
            .repository
            .delete(id, actor)
            .await
            .map_err(map_repository_error)?;
        self.discard_blobs(&removed).await;
        Ok(())
    }
}

#[async_trait]
impl<R, B> ListingQueries for ListingService<R, B>
where
    R: ListingRepository,
    B: BlobStore,
{
    async fn search_listings(
        &self,
        query: Option<&str>,
        property_type: Option<PropertyType>,
    ) -> Result<Vec<Listing>, Error> {
        let listings = self.repository.list().await.map_err(map_repository_error)?;
        Ok(SearchFilter::new(query, property_type).apply(listings))
    }

    async fn get_listing(&self, id: ListingId) -> Result<ListingDetail, Error> {
        let listing = self
            .repository
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("listing {id} not found")))?;
        let images = self
            .repository
            .list_images(id)
            .await
            .map_err(map_repository_error)?;
        Ok(ListingDetail { listing, images })
    }

    async fn listings_for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, Error> {
        self.repository
            .list_by_owner(owner)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "listing_service_tests.rs"]
mod tests;

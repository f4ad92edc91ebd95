//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to reach databases and blob
//! storage; driving ports are the use-case surface inbound adapters call.
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error as DomainError;
use crate::domain::listing::{
    ImageId, Listing, ListingChanges, ListingDraft, ListingId, ListingImage, PropertyType,
};
use crate::domain::user::{User, UserId};

/// Opaque handle naming a stored blob.
///
/// Handles are storage-relative; [`BlobStore::url_for`] turns one into an
/// absolute, publicly fetchable URL. Persisting the handle rather than a
/// rendered URL keeps stored rows valid when the public host changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Wrap a storage-relative object name.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the handle as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for BlobHandle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Raw image bytes submitted for upload, with the client-suggested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    /// Name suggested by the uploader; sanitised by the store.
    pub file_name: String,
    /// The image bytes.
    pub bytes: Vec<u8>,
}

/// Errors surfaced by blob storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The store could not be reached or refused the operation.
    #[error("blob store unavailable: {message}")]
    Unavailable {
        /// Adapter-provided description.
        message: String,
    },
    /// Reading, writing, or removing the object failed.
    #[error("blob store i/o failed: {message}")]
    Io {
        /// Adapter-provided description.
        message: String,
    },
}

impl StorageError {
    /// Helper for connectivity failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Helper for i/o failures.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// Blob storage driven port.
///
/// The store is treated as opaque: bytes go in, a durable handle comes out.
/// Upload failures are expected to be downgraded by callers into per-image
/// warnings; delete failures are best-effort cleanup.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the blob and return its handle.
    async fn put(&self, blob: &ImageBlob) -> Result<BlobHandle, StorageError>;

    /// Remove a stored blob. Callers treat failures as best-effort cleanup,
    /// logging rather than propagating them.
    async fn delete(&self, handle: &BlobHandle) -> Result<(), StorageError>;

    /// Absolute, publicly fetchable URL for a stored blob.
    ///
    /// Must be absolute even when the underlying storage works in relative
    /// paths; a relative URL would resolve against the application host
    /// instead of the storage host.
    fn url_for(&self, handle: &BlobHandle) -> String;
}

/// Errors surfaced by the listing repository adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingRepositoryError {
    /// No listing with the requested id exists.
    #[error("listing not found")]
    NotFound,
    /// The acting identity does not own the listing it tried to mutate.
    #[error("actor does not own this listing")]
    Forbidden,
    /// Database connectivity or pool failures.
    #[error("listing repository unavailable: {message}")]
    Connection {
        /// Adapter-provided description.
        message: String,
    },
    /// Query execution or row decoding failures.
    #[error("listing repository query failed: {message}")]
    Query {
        /// Adapter-provided description.
        message: String,
    },
}

impl ListingRepositoryError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Listing persistence driven port.
///
/// Ownership is enforced here, inside the same atomic unit as the mutation,
/// so the check and the write cannot be separated by another writer.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// All listings, newest first (ties broken by descending id).
    async fn list(&self) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Look a listing up by id.
    async fn find_by_id(&self, id: ListingId)
    -> Result<Option<Listing>, ListingRepositoryError>;

    /// Listings owned by the given identity, newest first.
    async fn list_by_owner(&self, owner: &UserId)
    -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Gallery images for a listing, in submission order.
    async fn list_images(
        &self,
        id: ListingId,
    ) -> Result<Vec<ListingImage>, ListingRepositoryError>;

    /// Persist a new listing owned by `owner`, stamping id and `created_at`.
    async fn create(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
        cover_image: Option<&BlobHandle>,
    ) -> Result<Listing, ListingRepositoryError>;

    /// Apply a partial update after re-checking ownership transactionally.
    ///
    /// Fails with [`ListingRepositoryError::NotFound`] when the id is absent
    /// and [`ListingRepositoryError::Forbidden`] when `actor` is not the
    /// owner.
    async fn update(
        &self,
        id: ListingId,
        actor: &UserId,
        changes: &ListingChanges,
    ) -> Result<Listing, ListingRepositoryError>;

    /// Delete a listing and cascade its gallery rows in one atomic unit.
    ///
    /// Returns every removed blob handle (gallery plus cover) so the caller
    /// can clean up storage.
    async fn delete(
        &self,
        id: ListingId,
        actor: &UserId,
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError>;

    /// Attach stored blobs to a listing as gallery images, in order.
    async fn add_images(
        &self,
        id: ListingId,
        actor: &UserId,
        blobs: &[BlobHandle],
    ) -> Result<Vec<ListingImage>, ListingRepositoryError>;

    /// Delete the subset of `image_ids` that belong to the listing.
    ///
    /// Ids belonging to other listings are silently ignored, never an error:
    /// the subset filter is what stops cross-listing tampering via forged
    /// ids. Returns the handles of the images actually removed.
    async fn remove_images(
        &self,
        id: ListingId,
        actor: &UserId,
        image_ids: &[ImageId],
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError>;
}

/// Errors surfaced by the user persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Database connectivity or pool failures.
    #[error("user persistence connection failed: {message}")]
    Connection {
        /// Adapter-provided description.
        message: String,
    },
    /// Query execution or row decoding failures.
    #[error("user persistence query failed: {message}")]
    Query {
        /// Adapter-provided description.
        message: String,
    },
}

impl UserPersistenceError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// User persistence driven port, consumed by the login adapter to guarantee
/// the authenticated identity has an account row.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or refresh the user row.
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Look a user up by identity.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;
}

/// Credential verification driving port.
///
/// Implementations stand in for the external identity provider; the domain
/// only cares that a successful authentication yields the actor identity
/// that ownership checks compare against.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and return the authenticated identity.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, DomainError>;
}

/// Input bundle for creating a listing together with its gallery.
#[derive(Debug, Clone)]
pub struct CreateListingRequest {
    /// Validated-shape field payload.
    pub draft: ListingDraft,
    /// Optional cover photo to upload.
    pub cover_image: Option<ImageBlob>,
    /// Gallery photos to upload, in submission order.
    pub images: Vec<ImageBlob>,
}

/// Input bundle for updating a listing and reshaping its gallery.
#[derive(Debug, Clone, Default)]
pub struct UpdateListingRequest {
    /// Partial field update.
    pub changes: ListingChanges,
    /// Optional replacement cover photo.
    pub cover_image: Option<ImageBlob>,
    /// Gallery photos to add, in submission order.
    pub new_images: Vec<ImageBlob>,
    /// Gallery image ids to remove; foreign ids are ignored.
    pub delete_image_ids: Vec<ImageId>,
}

/// Report for one gallery upload that was skipped.
///
/// Warnings are the reportable half of the partial-failure policy: the
/// listing mutation succeeds while each failed upload is named here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryWarning {
    /// Client-suggested name of the skipped image.
    pub file_name: String,
    /// Why the upload was skipped.
    pub reason: String,
}

/// Result of a create or update: the listing, the final gallery state, and
/// any per-image upload warnings.
#[derive(Debug, Clone)]
pub struct ListingMutationOutcome {
    /// The persisted listing after the mutation.
    pub listing: Listing,
    /// The gallery images attached after the mutation.
    pub images: Vec<ListingImage>,
    /// Per-image upload warnings; never fatal.
    pub warnings: Vec<GalleryWarning>,
}

/// A listing together with its gallery.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    /// The listing record.
    pub listing: Listing,
    /// Gallery images in submission order.
    pub images: Vec<ListingImage>,
}

/// Mutating listing use-cases, driving port for inbound adapters.
#[async_trait]
pub trait ListingCommands: Send + Sync {
    /// Create a listing owned by `actor`, uploading its gallery.
    async fn create_listing(
        &self,
        actor: &UserId,
        request: CreateListingRequest,
    ) -> Result<ListingMutationOutcome, DomainError>;

    /// Update `actor`'s listing, applying field changes then gallery
    /// additions then gallery removals.
    async fn update_listing(
        &self,
        actor: &UserId,
        id: ListingId,
        request: UpdateListingRequest,
    ) -> Result<ListingMutationOutcome, DomainError>;

    /// Delete `actor`'s listing, cascading its gallery.
    async fn delete_listing(&self, actor: &UserId, id: ListingId) -> Result<(), DomainError>;
}

/// Read-only listing use-cases, driving port for inbound adapters.
#[async_trait]
pub trait ListingQueries: Send + Sync {
    /// Listings matching the optional text query and property-type filter,
    /// newest first. Safe to call unauthenticated.
    async fn search_listings(
        &self,
        query: Option<&str>,
        property_type: Option<PropertyType>,
    ) -> Result<Vec<Listing>, DomainError>;

    /// A single listing with its gallery.
    async fn get_listing(&self, id: ListingId) -> Result<ListingDetail, DomainError>;

    /// Listings owned by `owner`, newest first; the dashboard view.
    async fn listings_for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, DomainError>;
}

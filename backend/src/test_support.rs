//! Test utilities for the backend crate.
//!
//! In-memory implementations of the domain driven ports, shared by unit
//! tests (in `src/`) and integration tests (in `tests/`, via the
//! `test-support` feature). The doubles honour the full port contracts
//! (ownership checks, cascade deletion, subset image removal, ordering), so
//! suites exercise the same semantics the PostgreSQL adapter provides.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::listing::{
    ImageId, Listing, ListingChanges, ListingDraft, ListingId, ListingImage, ListingRecord,
};
use crate::domain::ports::{
    BlobHandle, BlobStore, ImageBlob, ListingRepository, ListingRepositoryError, LoginService,
    StorageError,
};
use crate::domain::user::UserId;
use crate::domain::{Error, LoginCredentials};

#[derive(Default)]
struct RepoState {
    next_listing_id: i64,
    next_image_id: i64,
    ticks: i64,
    listings: Vec<Listing>,
    images: Vec<ListingImage>,
    fail_reads: bool,
}

/// In-memory [`ListingRepository`] honouring the full port contract.
#[derive(Default)]
pub struct InMemoryListingRepository {
    state: Mutex<RepoState>,
}

impl InMemoryListingRepository {
    /// Fresh, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make read operations fail with a connection error.
    pub fn fail_reads(&self) {
        self.state.lock().expect("state lock").fail_reads = true;
    }

    /// Direct snapshot of a stored listing, bypassing the port.
    pub fn stored_listing(&self, id: ListingId) -> Option<Listing> {
        self.state
            .lock()
            .expect("state lock")
            .listings
            .iter()
            .find(|listing| listing.id() == id)
            .cloned()
    }

    /// Direct snapshot of a stored image, bypassing the port.
    pub fn stored_image(&self, id: ImageId) -> Option<ListingImage> {
        self.state
            .lock()
            .expect("state lock")
            .images
            .iter()
            .find(|image| image.id() == id)
            .cloned()
    }

    fn created_at_for(ticks: i64) -> DateTime<Utc> {
        let base = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        base + Duration::seconds(ticks)
    }
}

fn newest_first(mut listings: Vec<Listing>) -> Vec<Listing> {
    listings.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    listings
}

fn check_ownership(
    state: &RepoState,
    id: ListingId,
    actor: &UserId,
) -> Result<usize, ListingRepositoryError> {
    let index = state
        .listings
        .iter()
        .position(|listing| listing.id() == id)
        .ok_or(ListingRepositoryError::NotFound)?;
    let listing = state
        .listings
        .get(index)
        .ok_or(ListingRepositoryError::NotFound)?;
    if listing.owner() != actor {
        return Err(ListingRepositoryError::Forbidden);
    }
    Ok(index)
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn list(&self) -> Result<Vec<Listing>, ListingRepositoryError> {
        let state = self.state.lock().expect("state lock");
        if state.fail_reads {
            return Err(ListingRepositoryError::connection("repository offline"));
        }
        Ok(newest_first(state.listings.clone()))
    }

    async fn find_by_id(
        &self,
        id: ListingId,
    ) -> Result<Option<Listing>, ListingRepositoryError> {
        let state = self.state.lock().expect("state lock");
        if state.fail_reads {
            return Err(ListingRepositoryError::connection("repository offline"));
        }
        Ok(state
            .listings
            .iter()
            .find(|listing| listing.id() == id)
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let state = self.state.lock().expect("state lock");
        Ok(newest_first(
            state
                .listings
                .iter()
                .filter(|listing| listing.owner() == owner)
                .cloned()
                .collect(),
        ))
    }

    async fn list_images(
        &self,
        id: ListingId,
    ) -> Result<Vec<ListingImage>, ListingRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut images: Vec<ListingImage> = state
            .images
            .iter()
            .filter(|image| image.listing_id() == id)
            .cloned()
            .collect();
        images.sort_by_key(ListingImage::id);
        Ok(images)
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
        cover_image: Option<&BlobHandle>,
    ) -> Result<Listing, ListingRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        state.next_listing_id += 1;
        state.ticks += 1;
        let record = ListingRecord {
            id: ListingId::new(state.next_listing_id),
            owner: *owner,
            property_type: draft.property_type,
            title: draft.title.clone(),
            description: draft.description.clone(),
            price: draft.price,
            location: draft.location,
            room_type: draft.room_type,
            owner_name: draft.owner_name.clone(),
            contact_number: draft.contact_number.clone(),
            available_from: draft.available_from,
            cover_image: cover_image.cloned(),
            created_at: Self::created_at_for(state.ticks),
        };
        let listing =
            Listing::new(record).map_err(|err| ListingRepositoryError::query(err.to_string()))?;
        state.listings.push(listing.clone());
        Ok(listing)
    }

    async fn update(
        &self,
        id: ListingId,
        actor: &UserId,
        changes: &ListingChanges,
    ) -> Result<Listing, ListingRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        let index = check_ownership(&state, id, actor)?;
        let current = state
            .listings
            .get(index)
            .ok_or(ListingRepositoryError::NotFound)?
            .clone();
        let updated = current.with_changes(changes);
        if let Some(slot) = state.listings.get_mut(index) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        id: ListingId,
        actor: &UserId,
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        let index = check_ownership(&state, id, actor)?;
        let listing = state.listings.remove(index);

        let mut handles: Vec<BlobHandle> = Vec::new();
        state.images.retain(|image| {
            if image.listing_id() == id {
                handles.push(image.blob().clone());
                false
            } else {
                true
            }
        });
        if let Some(cover) = listing.cover_image() {
            handles.push(cover.clone());
        }
        Ok(handles)
    }

    async fn add_images(
        &self,
        id: ListingId,
        actor: &UserId,
        blobs: &[BlobHandle],
    ) -> Result<Vec<ListingImage>, ListingRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        check_ownership(&state, id, actor)?;
        let mut created = Vec::with_capacity(blobs.len());
        for blob in blobs {
            state.next_image_id += 1;
            let image = ListingImage::new(ImageId::new(state.next_image_id), id, blob.clone());
            state.images.push(image.clone());
            created.push(image);
        }
        Ok(created)
    }

    async fn remove_images(
        &self,
        id: ListingId,
        actor: &UserId,
        image_ids: &[ImageId],
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        check_ownership(&state, id, actor)?;
        let wanted: HashSet<ImageId> = image_ids.iter().copied().collect();
        let mut removed = Vec::new();
        state.images.retain(|image| {
            if image.listing_id() == id && wanted.contains(&image.id()) {
                removed.push(image.blob().clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[derive(Default)]
struct BlobState {
    objects: HashMap<String, Vec<u8>>,
    fail_uploads: HashSet<String>,
    fail_deletes: bool,
    deleted: Vec<String>,
    counter: u64,
}

/// In-memory [`BlobStore`] with scriptable per-file upload failures.
#[derive(Default)]
pub struct InMemoryBlobStore {
    state: Mutex<BlobState>,
}

impl InMemoryBlobStore {
    /// Fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads with the given suggested name fail.
    pub fn fail_uploads_named(&self, file_name: impl Into<String>) {
        self.state
            .lock()
            .expect("state lock")
            .fail_uploads
            .insert(file_name.into());
    }

    /// Make every delete fail, to exercise best-effort cleanup paths.
    pub fn fail_deletes(&self) {
        self.state.lock().expect("state lock").fail_deletes = true;
    }

    /// True when a blob with this handle is currently stored.
    pub fn contains(&self, handle: &BlobHandle) -> bool {
        self.state
            .lock()
            .expect("state lock")
            .objects
            .contains_key(handle.as_str())
    }

    /// Handles deleted so far, in deletion order.
    pub fn deleted_handles(&self) -> Vec<String> {
        self.state.lock().expect("state lock").deleted.clone()
    }

    /// Number of blobs currently stored.
    pub fn stored_count(&self) -> usize {
        self.state.lock().expect("state lock").objects.len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, blob: &ImageBlob) -> Result<BlobHandle, StorageError> {
        let mut state = self.state.lock().expect("state lock");
        if state.fail_uploads.contains(&blob.file_name) {
            return Err(StorageError::io(format!(
                "simulated upload failure for {}",
                blob.file_name
            )));
        }
        state.counter += 1;
        let handle = format!("{:04}-{}", state.counter, blob.file_name);
        state.objects.insert(handle.clone(), blob.bytes.clone());
        Ok(BlobHandle::new(handle))
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<(), StorageError> {
        let mut state = self.state.lock().expect("state lock");
        if state.fail_deletes {
            return Err(StorageError::io("simulated delete failure"));
        }
        state.objects.remove(handle.as_str());
        state.deleted.push(handle.as_str().to_owned());
        Ok(())
    }

    fn url_for(&self, handle: &BlobHandle) -> String {
        format!("http://media.test/{handle}")
    }
}

/// In-memory [`LoginService`] with a fixed username/password/identity table.
#[derive(Default)]
pub struct InMemoryLoginService {
    accounts: HashMap<String, (String, UserId)>,
}

impl InMemoryLoginService {
    /// Empty service rejecting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account the service will accept.
    #[must_use]
    pub fn with_account(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        id: UserId,
    ) -> Self {
        self.accounts
            .insert(username.into(), (password.into(), id));
        self
    }
}

#[async_trait]
impl LoginService for InMemoryLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        match self.accounts.get(credentials.username()) {
            Some((password, id)) if password == credentials.password() => Ok(*id),
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

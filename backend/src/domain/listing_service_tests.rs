//! Regression coverage for listing service orchestration: ownership,
//! partial-failure uploads, cascade cleanup, and search composition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::listing::{City, ImageId, ListingChanges, ListingDraft, ListingImage, RoomType};
use crate::domain::ports::StorageError;
use crate::test_support::{InMemoryBlobStore, InMemoryListingRepository};

fn owner_a() -> UserId {
    UserId::new("11111111-1111-1111-1111-111111111111").expect("valid id")
}

fn owner_b() -> UserId {
    UserId::new("22222222-2222-2222-2222-222222222222").expect("valid id")
}

fn draft(title: &str, city: City, property_type: PropertyType) -> ListingDraft {
    ListingDraft {
        property_type,
        title: title.to_owned(),
        description: "well lit, close to the market".to_owned(),
        price: 5000,
        location: city,
        room_type: RoomType::OneBhk,
        owner_name: "Shyam".to_owned(),
        contact_number: "9800000001".to_owned(),
        available_from: NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"),
    }
}

fn blob(name: &str) -> ImageBlob {
    ImageBlob {
        file_name: name.to_owned(),
        bytes: vec![0xAB; 64],
    }
}

fn service(
    repository: &Arc<InMemoryListingRepository>,
    store: &Arc<InMemoryBlobStore>,
) -> ListingService<InMemoryListingRepository, InMemoryBlobStore> {
    ListingService::new(Arc::clone(repository), Arc::clone(store))
}

fn create_request(
    title: &str,
    images: Vec<ImageBlob>,
) -> CreateListingRequest {
    CreateListingRequest {
        draft: draft(title, City::Kathmandu, PropertyType::Apartment),
        cover_image: None,
        images,
    }
}

#[tokio::test]
async fn create_persists_owner_from_the_acting_identity() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let outcome = svc
        .create_listing(&owner_a(), create_request("Studio", Vec::new()))
        .await
        .expect("create should succeed");

    assert_eq!(outcome.listing.owner(), &owner_a());
    let stored = repository
        .stored_listing(outcome.listing.id())
        .expect("listing stored");
    assert_eq!(stored.owner(), &owner_a());
}

#[tokio::test]
async fn create_survives_a_failed_gallery_upload() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    store.fail_uploads_named("two.jpg");
    let svc = service(&repository, &store);

    let outcome = svc
        .create_listing(
            &owner_a(),
            create_request("Studio", vec![blob("one.jpg"), blob("two.jpg")]),
        )
        .await
        .expect("listing creation must not roll back on upload failure");

    assert_eq!(outcome.listing.title(), "Studio");
    assert_eq!(outcome.listing.price(), 5000);
    assert_eq!(outcome.images.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
    let warning = outcome.warnings.first().expect("one warning");
    assert_eq!(warning.file_name, "two.jpg");

    let gallery = repository
        .list_images(outcome.listing.id())
        .await
        .expect("gallery readable");
    assert_eq!(gallery.len(), 1);
}

#[tokio::test]
async fn create_succeeds_with_zero_attached_images() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    store.fail_uploads_named("only.jpg");
    let svc = service(&repository, &store);

    let outcome = svc
        .create_listing(&owner_a(), create_request("Bare", vec![blob("only.jpg")]))
        .await
        .expect("create should succeed");

    assert!(outcome.images.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(repository.stored_listing(outcome.listing.id()).is_some());
}

#[tokio::test]
async fn create_rejects_invalid_fields_before_uploading() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let err = svc
        .create_listing(&owner_a(), create_request("", vec![blob("one.jpg")]))
        .await
        .expect_err("empty title must fail");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("violation details");
    assert_eq!(details["violations"][0]["field"], "title");
    assert_eq!(store.stored_count(), 0);
}

#[rstest]
#[case::too_many((0..=MAX_GALLERY_IMAGES).map(|i| blob(&format!("{i}.jpg"))).collect(), "too_many_images")]
#[case::oversized(vec![ImageBlob { file_name: "big.jpg".to_owned(), bytes: vec![0; MAX_IMAGE_BYTES + 1] }], "image_too_large")]
#[case::empty(vec![ImageBlob { file_name: "void.jpg".to_owned(), bytes: Vec::new() }], "empty_image")]
#[tokio::test]
async fn create_enforces_gallery_bounds(
    #[case] images: Vec<ImageBlob>,
    #[case] expected_code: &str,
) {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let err = svc
        .create_listing(&owner_a(), create_request("Bounded", images))
        .await
        .expect_err("bounds must be enforced");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details present");
    assert_eq!(details["code"], expected_code);
}

#[tokio::test]
async fn update_by_non_owner_is_forbidden_and_leaves_the_record_unchanged() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(&owner_a(), create_request("Studio", Vec::new()))
        .await
        .expect("create should succeed");

    let err = svc
        .update_listing(
            &owner_b(),
            created.listing.id(),
            UpdateListingRequest {
                changes: ListingChanges {
                    price: Some(1),
                    ..ListingChanges::default()
                },
                ..UpdateListingRequest::default()
            },
        )
        .await
        .expect_err("non-owner must be rejected");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    let stored = repository
        .stored_listing(created.listing.id())
        .expect("listing still stored");
    assert_eq!(stored.price(), 5000);
    assert_eq!(stored.owner(), &owner_a());
}

#[tokio::test]
async fn update_by_owner_applies_fields_and_keeps_owner() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(&owner_a(), create_request("Studio", Vec::new()))
        .await
        .expect("create should succeed");

    let outcome = svc
        .update_listing(
            &owner_a(),
            created.listing.id(),
            UpdateListingRequest {
                changes: ListingChanges {
                    price: Some(6000),
                    ..ListingChanges::default()
                },
                ..UpdateListingRequest::default()
            },
        )
        .await
        .expect("owner update should succeed");

    assert_eq!(outcome.listing.price(), 6000);
    assert_eq!(outcome.listing.owner(), &owner_a());
    assert_eq!(outcome.listing.created_at(), created.listing.created_at());
}

#[tokio::test]
async fn update_of_a_missing_listing_is_not_found() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let err = svc
        .update_listing(
            &owner_a(),
            ListingId::new(404),
            UpdateListingRequest::default(),
        )
        .await
        .expect_err("missing listing must fail");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn update_applies_additions_before_deletions() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(&owner_a(), create_request("Gallery", vec![blob("old.jpg")]))
        .await
        .expect("create should succeed");
    let old_image = created.images.first().expect("one image").clone();

    let outcome = svc
        .update_listing(
            &owner_a(),
            created.listing.id(),
            UpdateListingRequest {
                new_images: vec![blob("new.jpg")],
                delete_image_ids: vec![old_image.id()],
                ..UpdateListingRequest::default()
            },
        )
        .await
        .expect("update should succeed");

    assert_eq!(outcome.images.len(), 1);
    let survivor = outcome.images.first().expect("one image");
    assert!(survivor.blob().as_str().ends_with("new.jpg"));
    assert!(
        store
            .deleted_handles()
            .contains(&old_image.blob().as_str().to_owned())
    );
}

#[tokio::test]
async fn remove_images_ignores_ids_from_another_listing() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let listing_a = svc
        .create_listing(&owner_a(), create_request("A", vec![blob("a.jpg")]))
        .await
        .expect("create A");
    let listing_b = svc
        .create_listing(&owner_a(), create_request("B", vec![blob("b.jpg")]))
        .await
        .expect("create B");
    let img_a = listing_a.images.first().expect("image on A").clone();
    let img_b = listing_b.images.first().expect("image on B").clone();

    let outcome = svc
        .update_listing(
            &owner_a(),
            listing_a.listing.id(),
            UpdateListingRequest {
                delete_image_ids: vec![img_b.id()],
                ..UpdateListingRequest::default()
            },
        )
        .await
        .expect("foreign ids are ignored, not an error");

    assert_eq!(outcome.images.len(), 1);
    assert!(repository.stored_image(img_b.id()).is_some());
    assert!(repository.stored_image(img_a.id()).is_some());
}

#[tokio::test]
async fn delete_cascades_gallery_rows_and_cleans_blobs() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(
            &owner_a(),
            CreateListingRequest {
                draft: draft("Doomed", City::Pokhara, PropertyType::Room),
                cover_image: Some(blob("cover.jpg")),
                images: vec![blob("one.jpg"), blob("two.jpg")],
            },
        )
        .await
        .expect("create should succeed");
    let id = created.listing.id();
    let image_ids: Vec<ImageId> = created.images.iter().map(ListingImage::id).collect();

    svc.delete_listing(&owner_a(), id)
        .await
        .expect("delete should succeed");

    assert!(repository.stored_listing(id).is_none());
    for image_id in image_ids {
        assert!(repository.stored_image(image_id).is_none());
    }
    // Two gallery blobs plus the cover are all cleaned up.
    assert_eq!(store.deleted_handles().len(), 3);

    let err = svc
        .delete_listing(&owner_a(), id)
        .await
        .expect_err("repeated delete is not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn delete_by_non_owner_is_forbidden() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(&owner_a(), create_request("Kept", Vec::new()))
        .await
        .expect("create should succeed");

    let err = svc
        .delete_listing(&owner_b(), created.listing.id())
        .await
        .expect_err("non-owner delete must fail");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(repository.stored_listing(created.listing.id()).is_some());
}

#[tokio::test]
async fn delete_swallows_blob_cleanup_failures() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let created = svc
        .create_listing(&owner_a(), create_request("Sticky", vec![blob("stuck.jpg")]))
        .await
        .expect("create should succeed");
    store.fail_deletes();

    svc.delete_listing(&owner_a(), created.listing.id())
        .await
        .expect("storage failures must not fail the delete");

    assert!(repository.stored_listing(created.listing.id()).is_none());
}

struct SlowBlobStore {
    delay: Duration,
}

#[async_trait]
impl BlobStore for SlowBlobStore {
    async fn put(&self, blob: &ImageBlob) -> Result<BlobHandle, StorageError> {
        tokio::time::sleep(self.delay).await;
        Ok(BlobHandle::new(blob.file_name.clone()))
    }

    async fn delete(&self, _handle: &BlobHandle) -> Result<(), StorageError> {
        Ok(())
    }

    fn url_for(&self, handle: &BlobHandle) -> String {
        format!("http://slow.test/{handle}")
    }
}

#[tokio::test]
async fn timed_out_uploads_are_reported_not_fatal() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(SlowBlobStore {
        delay: Duration::from_millis(200),
    });
    let svc = ListingService::new(Arc::clone(&repository), store)
        .with_upload_timeout(Duration::from_millis(20));

    let outcome = svc
        .create_listing(&owner_a(), create_request("Patient", vec![blob("slow.jpg")]))
        .await
        .expect("timeouts fall under the partial-failure policy");

    assert!(outcome.images.is_empty());
    let warning = outcome.warnings.first().expect("timeout warning");
    assert!(warning.reason.contains("timed out"));
    assert!(repository.stored_listing(outcome.listing.id()).is_some());
}

#[tokio::test]
async fn search_composes_repository_and_filter() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    svc.create_listing(
        &owner_a(),
        CreateListingRequest {
            draft: draft("Cozy Room", City::Pokhara, PropertyType::Room),
            cover_image: None,
            images: Vec::new(),
        },
    )
    .await
    .expect("create should succeed");
    svc.create_listing(&owner_b(), create_request("Studio", Vec::new()))
        .await
        .expect("create should succeed");

    let by_city = svc
        .search_listings(Some("pokhara"), None)
        .await
        .expect("search should succeed");
    assert_eq!(by_city.len(), 1);
    assert_eq!(by_city.first().map(Listing::title), Some("Cozy Room"));

    let by_title = svc
        .search_listings(Some("cozy"), None)
        .await
        .expect("search should succeed");
    assert_eq!(by_title.len(), 1);

    let unfiltered = svc
        .search_listings(None, None)
        .await
        .expect("search should succeed");
    let none_literal = svc
        .search_listings(Some("None"), None)
        .await
        .expect("search should succeed");
    let blank = svc
        .search_listings(Some(""), None)
        .await
        .expect("search should succeed");
    assert_eq!(unfiltered, none_literal);
    assert_eq!(unfiltered, blank);
    assert_eq!(unfiltered.len(), 2);

    let apartments = svc
        .search_listings(None, Some(PropertyType::Apartment))
        .await
        .expect("search should succeed");
    assert_eq!(apartments.len(), 1);
    assert_eq!(apartments.first().map(Listing::title), Some("Studio"));
}

#[tokio::test]
async fn get_listing_returns_not_found_for_missing_ids() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    let err = svc
        .get_listing(ListingId::new(999))
        .await
        .expect_err("missing id must be not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn owner_dashboard_lists_only_that_owners_listings_newest_first() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);

    svc.create_listing(&owner_a(), create_request("First", Vec::new()))
        .await
        .expect("create");
    svc.create_listing(&owner_b(), create_request("Other", Vec::new()))
        .await
        .expect("create");
    svc.create_listing(&owner_a(), create_request("Second", Vec::new()))
        .await
        .expect("create");

    let mine = svc
        .listings_for_owner(&owner_a())
        .await
        .expect("dashboard should succeed");
    let titles: Vec<&str> = mine.iter().map(Listing::title).collect();
    assert_eq!(titles, vec!["Second", "First"]);
    assert!(mine.iter().all(|listing| listing.owner() == &owner_a()));
}

#[tokio::test]
async fn repository_outages_surface_as_service_unavailable() {
    let repository = Arc::new(InMemoryListingRepository::new());
    let store = Arc::new(InMemoryBlobStore::new());
    let svc = service(&repository, &store);
    repository.fail_reads();

    let err = svc
        .search_listings(None, None)
        .await
        .expect_err("outage must surface");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

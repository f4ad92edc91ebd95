//! PostgreSQL-backed `ListingRepository` implementation using Diesel ORM.
//!
//! Mutations lock the listing row with `SELECT ... FOR UPDATE` inside a
//! transaction, so the ownership check and the write form one atomic unit
//! and same-listing operations serialise on the row lock. Gallery rows are
//! removed in the same transaction as their parent: the cascade is
//! explicit, not delegated to foreign-key magic.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::listing::{
    ImageId, Listing, ListingChanges, ListingDraft, ListingId, ListingImage,
};
use crate::domain::ports::{BlobHandle, ListingRepository, ListingRepositoryError};
use crate::domain::user::UserId;

use super::models::{
    ListingImageRow, ListingRow, NewListingImageRow, NewListingRow, changes_to_row,
    image_from_row, listing_from_row,
};
use super::pool::DbPool;
use super::schema::{listing_images, listings};

/// Diesel-backed implementation of the listing repository port.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Fetch a listing row under `FOR UPDATE`, enforcing existence and
/// ownership before any mutation in the surrounding transaction.
async fn fetch_owned_listing(
    conn: &mut AsyncPgConnection,
    id: i64,
    owner: Uuid,
) -> Result<ListingRow, ListingRepositoryError> {
    let row = listings::table
        .find(id)
        .for_update()
        .select(ListingRow::as_select())
        .first::<ListingRow>(conn)
        .await
        .optional()?
        .ok_or(ListingRepositoryError::NotFound)?;
    if row.owner_id != owner {
        return Err(ListingRepositoryError::Forbidden);
    }
    Ok(row)
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn list(&self) -> Result<Vec<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<ListingRow> = listings::table
            .order((listings::created_at.desc(), listings::id.desc()))
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(listing_from_row).collect()
    }

    async fn find_by_id(
        &self,
        id: ListingId,
    ) -> Result<Option<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let row = listings::table
            .find(id.get())
            .select(ListingRow::as_select())
            .first::<ListingRow>(&mut conn)
            .await
            .optional()?;
        row.map(listing_from_row).transpose()
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::owner_id.eq(*owner.as_uuid()))
            .order((listings::created_at.desc(), listings::id.desc()))
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(listing_from_row).collect()
    }

    async fn list_images(
        &self,
        id: ListingId,
    ) -> Result<Vec<ListingImage>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<ListingImageRow> = listing_images::table
            .filter(listing_images::listing_id.eq(id.get()))
            .order(listing_images::id.asc())
            .select(ListingImageRow::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(image_from_row).collect())
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
        cover_image: Option<&BlobHandle>,
    ) -> Result<Listing, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let new_row = NewListingRow {
            owner_id: *owner.as_uuid(),
            property_type: draft.property_type.as_str(),
            title: &draft.title,
            description: &draft.description,
            price: i64::from(draft.price),
            location: draft.location.as_str(),
            room_type: draft.room_type.as_str(),
            owner_name: &draft.owner_name,
            contact_number: &draft.contact_number,
            available_from: draft.available_from,
            cover_image: cover_image.map(BlobHandle::as_str),
            created_at: Utc::now(),
        };

        let row: ListingRow = diesel::insert_into(listings::table)
            .values(&new_row)
            .returning(ListingRow::as_returning())
            .get_result(&mut conn)
            .await?;
        listing_from_row(row)
    }

    async fn update(
        &self,
        id: ListingId,
        actor: &UserId,
        changes: &ListingChanges,
    ) -> Result<Listing, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let listing_id = id.get();
        let actor_id = *actor.as_uuid();

        conn.transaction::<Listing, ListingRepositoryError, _>(|conn| {
            async move {
                let row = fetch_owned_listing(conn, listing_id, actor_id).await?;
                if changes.is_empty() {
                    return listing_from_row(row);
                }

                let updated: ListingRow = diesel::update(listings::table.find(listing_id))
                    .set(&changes_to_row(changes))
                    .returning(ListingRow::as_returning())
                    .get_result(conn)
                    .await?;
                listing_from_row(updated)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete(
        &self,
        id: ListingId,
        actor: &UserId,
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let listing_id = id.get();
        let actor_id = *actor.as_uuid();

        conn.transaction::<Vec<BlobHandle>, ListingRepositoryError, _>(|conn| {
            async move {
                let row = fetch_owned_listing(conn, listing_id, actor_id).await?;

                let removed_blobs: Vec<String> = diesel::delete(
                    listing_images::table.filter(listing_images::listing_id.eq(listing_id)),
                )
                .returning(listing_images::blob)
                .get_results(conn)
                .await?;

                diesel::delete(listings::table.find(listing_id))
                    .execute(conn)
                    .await?;

                let mut handles: Vec<BlobHandle> =
                    removed_blobs.into_iter().map(BlobHandle::new).collect();
                if let Some(cover) = row.cover_image {
                    handles.push(BlobHandle::new(cover));
                }
                Ok(handles)
            }
            .scope_boxed()
        })
        .await
    }

    async fn add_images(
        &self,
        id: ListingId,
        actor: &UserId,
        blobs: &[BlobHandle],
    ) -> Result<Vec<ListingImage>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let listing_id = id.get();
        let actor_id = *actor.as_uuid();

        conn.transaction::<Vec<ListingImage>, ListingRepositoryError, _>(|conn| {
            async move {
                fetch_owned_listing(conn, listing_id, actor_id).await?;

                let new_rows: Vec<NewListingImageRow<'_>> = blobs
                    .iter()
                    .map(|blob| NewListingImageRow {
                        listing_id,
                        blob: blob.as_str(),
                    })
                    .collect();

                let created: Vec<ListingImageRow> = diesel::insert_into(listing_images::table)
                    .values(&new_rows)
                    .returning(ListingImageRow::as_returning())
                    .get_results(conn)
                    .await?;
                Ok(created.into_iter().map(image_from_row).collect())
            }
            .scope_boxed()
        })
        .await
    }

    async fn remove_images(
        &self,
        id: ListingId,
        actor: &UserId,
        image_ids: &[ImageId],
    ) -> Result<Vec<BlobHandle>, ListingRepositoryError> {
        let mut conn = self.pool.get().await?;
        let listing_id = id.get();
        let actor_id = *actor.as_uuid();
        let raw_ids: Vec<i64> = image_ids.iter().map(|image_id| image_id.get()).collect();

        conn.transaction::<Vec<BlobHandle>, ListingRepositoryError, _>(|conn| {
            async move {
                fetch_owned_listing(conn, listing_id, actor_id).await?;

                // The listing_id filter is the cross-listing tamper guard:
                // forged ids that belong to another listing simply match
                // nothing.
                let removed: Vec<String> = diesel::delete(
                    listing_images::table.filter(
                        listing_images::listing_id
                            .eq(listing_id)
                            .and(listing_images::id.eq_any(raw_ids)),
                    ),
                )
                .returning(listing_images::blob)
                .get_results(conn)
                .await?;
                Ok(removed.into_iter().map(BlobHandle::new).collect())
            }
            .scope_boxed()
        })
        .await
    }
}

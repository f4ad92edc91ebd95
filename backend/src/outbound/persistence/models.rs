//! Diesel row structs and their conversions into validated domain types.
//!
//! Row-to-domain conversion re-checks the closed vocabularies: a stored
//! value outside an enum surfaces as a query error instead of leaking into
//! the domain, so drift between the database and the code is caught at the
//! boundary.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::listing::{
    City, ImageId, Listing, ListingChanges, ListingId, ListingImage, ListingRecord, PropertyType,
    RoomType,
};
use crate::domain::ports::{BlobHandle, ListingRepositoryError, UserPersistenceError};
use crate::domain::user::{User, UserId, Username};

use super::schema::{listing_images, listings, users};

/// Listing row as stored in PostgreSQL.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListingRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub property_type: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub room_type: String,
    pub owner_name: String,
    pub contact_number: String,
    pub available_from: NaiveDate,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new listing.
#[derive(Debug, Insertable)]
#[diesel(table_name = listings)]
pub struct NewListingRow<'a> {
    pub owner_id: Uuid,
    pub property_type: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub price: i64,
    pub location: &'a str,
    pub room_type: &'a str,
    pub owner_name: &'a str,
    pub contact_number: &'a str,
    pub available_from: NaiveDate,
    pub cover_image: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Partial changeset for a listing update; `None` fields are not written.
///
/// `owner_id` and `created_at` have no slot here, mirroring the domain
/// [`ListingChanges`] type: an update statement cannot touch them.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = listings)]
pub struct ListingChangesRow<'a> {
    pub property_type: Option<&'a str>,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<i64>,
    pub location: Option<&'a str>,
    pub room_type: Option<&'a str>,
    pub owner_name: Option<&'a str>,
    pub contact_number: Option<&'a str>,
    pub available_from: Option<NaiveDate>,
    pub cover_image: Option<&'a str>,
}

/// Gallery image row as stored in PostgreSQL.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listing_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListingImageRow {
    pub id: i64,
    pub listing_id: i64,
    pub blob: String,
}

/// Insert payload for a gallery image.
#[derive(Debug, Insertable)]
#[diesel(table_name = listing_images)]
pub struct NewListingImageRow<'a> {
    pub listing_id: i64,
    pub blob: &'a str,
}

/// User row as stored in PostgreSQL.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a user row; timestamps use the column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
}

fn parse_stored<T: FromStr>(value: &str, what: &str) -> Result<T, ListingRepositoryError> {
    T::from_str(value).map_err(|_| {
        ListingRepositoryError::query(format!("stored {what} outside vocabulary: {value}"))
    })
}

/// Convert a database row into a validated domain listing.
pub fn listing_from_row(row: ListingRow) -> Result<Listing, ListingRepositoryError> {
    let ListingRow {
        id,
        owner_id,
        property_type,
        title,
        description,
        price,
        location,
        room_type,
        owner_name,
        contact_number,
        available_from,
        cover_image,
        created_at,
    } = row;

    let price = u32::try_from(price).map_err(|_| {
        ListingRepositoryError::query(format!("stored price out of range: {price}"))
    })?;

    let record = ListingRecord {
        id: ListingId::new(id),
        owner: UserId::from_uuid(owner_id),
        property_type: parse_stored::<PropertyType>(&property_type, "property type")?,
        title,
        description,
        price,
        location: parse_stored::<City>(&location, "location")?,
        room_type: parse_stored::<RoomType>(&room_type, "room type")?,
        owner_name,
        contact_number,
        available_from,
        cover_image: cover_image.map(BlobHandle::new),
        created_at,
    };

    Listing::new(record).map_err(|err| {
        ListingRepositoryError::query(format!("stored listing violates field constraints: {err}"))
    })
}

/// Convert a gallery image row into the domain type.
pub fn image_from_row(row: ListingImageRow) -> ListingImage {
    ListingImage::new(
        ImageId::new(row.id),
        ListingId::new(row.listing_id),
        BlobHandle::new(row.blob),
    )
}

/// Borrow a domain changeset as a Diesel changeset.
pub fn changes_to_row(changes: &ListingChanges) -> ListingChangesRow<'_> {
    ListingChangesRow {
        property_type: changes.property_type.map(PropertyType::as_str),
        title: changes.title.as_deref(),
        description: changes.description.as_deref(),
        price: changes.price.map(i64::from),
        location: changes.location.map(City::as_str),
        room_type: changes.room_type.map(RoomType::as_str),
        owner_name: changes.owner_name.as_deref(),
        contact_number: changes.contact_number.as_deref(),
        available_from: changes.available_from,
        cover_image: changes.cover_image.as_ref().map(BlobHandle::as_str),
    }
}

/// Convert a user row into the validated domain type.
pub fn user_from_row(row: UserRow) -> Result<User, UserPersistenceError> {
    let username = Username::new(&row.username).map_err(|err| {
        UserPersistenceError::query(format!("stored username invalid: {err}"))
    })?;
    Ok(User::new(UserId::from_uuid(row.id), username))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion edge cases.
    use rstest::rstest;

    use super::*;

    fn valid_row() -> ListingRow {
        ListingRow {
            id: 1,
            owner_id: Uuid::new_v4(),
            property_type: "Room".to_owned(),
            title: "Cozy Room".to_owned(),
            description: String::new(),
            price: 8000,
            location: "Pokhara".to_owned(),
            room_type: "Single".to_owned(),
            owner_name: "Sita".to_owned(),
            contact_number: "9800000000".to_owned(),
            available_from: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
            cover_image: Some("abc123-cover.jpg".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_rows_convert() {
        let listing = listing_from_row(valid_row()).expect("conversion should succeed");
        assert_eq!(listing.id(), ListingId::new(1));
        assert_eq!(listing.property_type(), PropertyType::Room);
        assert_eq!(
            listing.cover_image().map(BlobHandle::as_str),
            Some("abc123-cover.jpg")
        );
    }

    #[rstest]
    #[case::property_type(|row: &mut ListingRow| row.property_type = "Bungalow".to_owned())]
    #[case::location(|row: &mut ListingRow| row.location = "Lalitpur".to_owned())]
    #[case::room_type(|row: &mut ListingRow| row.room_type = "4BHK".to_owned())]
    fn rows_outside_the_vocabulary_are_rejected(#[case] corrupt: fn(&mut ListingRow)) {
        let mut row = valid_row();
        corrupt(&mut row);
        let err = listing_from_row(row).expect_err("vocabulary must be enforced");
        assert!(matches!(err, ListingRepositoryError::Query { .. }));
        assert!(err.to_string().contains("outside vocabulary"));
    }

    #[rstest]
    fn negative_stored_price_is_rejected() {
        let mut row = valid_row();
        row.price = -1;
        let err = listing_from_row(row).expect_err("negative price must fail");
        assert!(err.to_string().contains("out of range"));
    }

    #[rstest]
    fn changeset_skips_absent_fields() {
        let changes = ListingChanges {
            price: Some(9000),
            ..ListingChanges::default()
        };
        let row = changes_to_row(&changes);
        assert_eq!(row.price, Some(9000));
        assert_eq!(row.title, None);
        assert_eq!(row.cover_image, None);
    }
}

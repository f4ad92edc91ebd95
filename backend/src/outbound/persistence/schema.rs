//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, regenerate this file with
//! `diesel print-schema` or update it by hand to match.

diesel::table! {
    /// Account rows for authenticated owners.
    ///
    /// Account lifecycle belongs to the auth collaborator; rows here exist
    /// so listings have a referential owner.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique account username (max 150 characters).
        username -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published property listings.
    listings (id) {
        /// Primary key: BIGSERIAL, so descending id matches insertion order.
        id -> Int8,
        /// Owning user; never updated after insert.
        owner_id -> Uuid,
        /// Closed vocabulary: Room, Apartment, Hostel.
        property_type -> Varchar,
        /// Listing headline (max 200 characters).
        title -> Varchar,
        /// Free-text description.
        description -> Text,
        /// Monthly rent; non-negative.
        price -> Int8,
        /// Closed vocabulary of supported cities.
        location -> Varchar,
        /// Closed vocabulary: Single, Double, Shared, 1BHK, 2BHK, 3BHK.
        room_type -> Varchar,
        /// Contact display name (max 100 characters).
        owner_name -> Varchar,
        /// Contact phone number (max 15 characters).
        contact_number -> Varchar,
        /// First availability date.
        available_from -> Date,
        /// Optional blob handle of the cover photo.
        cover_image -> Nullable<Varchar>,
        /// Record creation timestamp; the default sort key, newest first.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Gallery photos owned by their parent listing.
    listing_images (id) {
        /// Primary key: BIGSERIAL.
        id -> Int8,
        /// Parent listing; rows are removed with the parent.
        listing_id -> Int8,
        /// Blob handle of the stored photo.
        blob -> Varchar,
    }
}

diesel::joinable!(listing_images -> listings (listing_id));
diesel::allow_tables_to_appear_in_same_query!(listing_images, listings, users);
